// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

pub mod locator;
pub mod session;
pub mod store;
pub mod transfer;

// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::cell::Cell;

use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

use roicopy_core::constant::{IMAGE_TYPE, OME_SCHEMA, ROI_TYPE};
use roicopy_core::error::RoiCopyError;
use roicopy_core::im::{BinaryGrid, Mask, Polygon, Roi, Shape, ShapeKind, encode_bitmask};

use crate::store::{ImageInfo, RoiStore};

// Largest page the JSON API serves by default
const DATASET_PAGE_SIZE: usize = 500;

/// Credentials for one OMERO.web server
#[derive(Debug, Clone, PartialEq)]
pub struct OmeroLogin {
    pub server: String,
    pub username: String,
    pub password: String,
    pub server_id: u32,
}

impl OmeroLogin {
    /// Base url of the web server, defaulting to https for bare hosts
    pub fn base_url(&self) -> String {
        let server = self.server.trim().trim_end_matches('/');
        if server.starts_with("http://") || server.starts_with("https://") {
            server.to_string()
        } else {
            format!("https://{}", server)
        }
    }
}

/// A blocking client for the OMERO.web JSON API
///
/// Each client owns its own session. Requests run one at a time on a
/// current-thread runtime. The session is closed by `close` or, failing
/// that, when the client is dropped.
pub struct OmeroClient {
    runtime: Runtime,
    client: Client,
    base_url: String,
    csrf_token: String,
    closed: Cell<bool>,
}

impl OmeroClient {
    /// Log in to an OMERO.web server
    pub fn connect(login: &OmeroLogin) -> Result<Self, RoiCopyError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| remote_error(anyhow!(err).context("Failed to start runtime")))?;

        let client = create_http_client().map_err(remote_error)?;
        let base_url = login.base_url();

        let csrf_token = runtime
            .block_on(login_session(&client, &base_url, login))
            .map_err(remote_error)?;

        Ok(Self {
            runtime,
            client,
            base_url,
            csrf_token,
            closed: Cell::new(false),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log out and release the server-side session
    pub fn close(&self) -> Result<(), RoiCopyError> {
        if self.closed.replace(true) {
            return Ok(());
        }

        let url = format!("{}/webclient/logout/", self.base_url);
        self.runtime
            .block_on(async {
                self.client
                    .post(&url)
                    .header("X-CSRFToken", &self.csrf_token)
                    .header("Referer", &self.base_url)
                    .send()
                    .await
                    .context("Failed to send logout request")?
                    .error_for_status()
                    .context("Logout was rejected")?;
                Ok::<(), anyhow::Error>(())
            })
            .map_err(remote_error)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.runtime.block_on(async {
            let value = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?
                .error_for_status()
                .with_context(|| format!("Request to {} was rejected", url))?
                .json::<T>()
                .await
                .with_context(|| format!("Failed to parse response from {}", url))?;
            Ok::<T, anyhow::Error>(value)
        })
    }

    fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        self.runtime.block_on(async {
            let bytes = self
                .client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?
                .error_for_status()
                .with_context(|| format!("Request to {} was rejected", url))?
                .bytes()
                .await
                .with_context(|| format!("Failed to read response from {}", url))?;
            Ok::<Vec<u8>, anyhow::Error>(bytes.to_vec())
        })
    }

    fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.runtime.block_on(async {
            let value = self
                .client
                .post(&url)
                .header("X-CSRFToken", &self.csrf_token)
                .header("Referer", &self.base_url)
                .json(body)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?
                .error_for_status()
                .with_context(|| format!("Request to {} was rejected", url))?
                .json::<T>()
                .await
                .with_context(|| format!("Failed to parse response from {}", url))?;
            Ok::<T, anyhow::Error>(value)
        })
    }

    /// Fetch a mask payload rendered as PNG and pack it into bits
    fn rendered_mask_bytes(&self, shape_id: i64, width: f64, height: f64) -> Result<Vec<u8>> {
        let png = self.get_bytes(&format!("/webgateway/render_shape_mask/{}/", shape_id))?;
        png_mask_bytes(&png, width, height)
            .with_context(|| format!("Mask {} could not be rendered", shape_id))
    }

    fn to_roi(&self, wire: WireRoi, image_id: i64) -> Result<Roi> {
        let mut roi = Roi::new(image_id);
        roi.id = wire.id;

        for shape in wire.shapes {
            let shape = match ShapeKind::from_type_name(&shape.kind) {
                ShapeKind::Mask => {
                    let bytes = match (&shape.bytes, shape.id) {
                        (Some(encoded), _) => BASE64
                            .decode(encoded)
                            .context("Mask bytes are not valid base64")?,
                        (None, Some(id)) => self.rendered_mask_bytes(
                            id,
                            shape.width.unwrap_or(0.0),
                            shape.height.unwrap_or(0.0),
                        )?,
                        (None, None) => bail!("Mask without id or bytes"),
                    };
                    Shape::Mask(Mask {
                        id: shape.id,
                        roi_id: wire.id,
                        the_t: shape.the_t,
                        the_c: shape.the_c,
                        the_z: shape.the_z,
                        x: shape.x.unwrap_or(0.0),
                        y: shape.y.unwrap_or(0.0),
                        width: shape.width.unwrap_or(0.0),
                        height: shape.height.unwrap_or(0.0),
                        bytes,
                    })
                }
                ShapeKind::Polygon => Shape::Polygon(Polygon {
                    id: shape.id,
                    the_t: shape.the_t,
                    the_z: shape.the_z,
                    points: shape.points.unwrap_or_default(),
                    stroke_color: shape.stroke_color,
                }),
                ShapeKind::Other(kind) => Shape::Other { id: shape.id, kind },
            };
            roi.add_shape(shape);
        }

        Ok(roi)
    }
}

impl Drop for OmeroClient {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl RoiStore for OmeroClient {
    fn image(&self, image_id: i64) -> Result<ImageInfo, RoiCopyError> {
        let response: WireData<WireImage> = self
            .get_json(&format!("/api/v0/m/images/{}/", image_id), &[])
            .map_err(remote_error)?;
        Ok(response.data.into())
    }

    fn dataset_images(&self, dataset_id: i64) -> Result<Vec<ImageInfo>, RoiCopyError> {
        let path = format!("/api/v0/m/datasets/{}/images/", dataset_id);
        let mut images = Vec::new();
        let mut offset = 0;

        loop {
            let page: WireData<Vec<WireImage>> = self
                .get_json(
                    &path,
                    &[
                        ("offset", offset.to_string()),
                        ("limit", DATASET_PAGE_SIZE.to_string()),
                    ],
                )
                .map_err(remote_error)?;

            let n = page.data.len();
            images.extend(page.data.into_iter().map(ImageInfo::from));

            if n < DATASET_PAGE_SIZE {
                break;
            }
            offset += n;
        }

        Ok(images)
    }

    fn has_rois(&self, image_id: i64) -> Result<bool, RoiCopyError> {
        let page: WirePage = self
            .get_json(
                "/api/v0/m/rois/",
                &[("image", image_id.to_string()), ("limit", "1".to_string())],
            )
            .map_err(remote_error)?;

        Ok(page.has_items())
    }

    fn find_rois(&self, image_id: i64, offset: usize, limit: usize) -> Result<Vec<Roi>, RoiCopyError> {
        let page: WireData<Vec<WireRoi>> = self
            .get_json(
                "/api/v0/m/rois/",
                &[
                    ("image", image_id.to_string()),
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .map_err(remote_error)?;

        page.data
            .into_iter()
            .map(|roi| self.to_roi(roi, image_id))
            .collect::<Result<Vec<Roi>>>()
            .map_err(remote_error)
    }

    fn save_roi(&self, roi: &Roi) -> Result<i64, RoiCopyError> {
        let response: WireData<WireSaved> = self
            .post_json("/api/v0/m/save/", &roi_to_json(roi))
            .map_err(remote_error)?;

        response.data.id.ok_or_else(|| {
            RoiCopyError::RemoteOperationError("Saved ROI has no identifier.".to_string())
        })
    }
}

fn remote_error(err: anyhow::Error) -> RoiCopyError {
    RoiCopyError::RemoteOperationError(format!("{:#}", err))
}

fn create_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("roicopy/", env!("CARGO_PKG_VERSION")))
        .cookie_store(true)
        .build()
        .context("Failed to create HTTP client")
}

/// Fetch a CSRF token and log in, returning the token for later writes
async fn login_session(client: &Client, base_url: &str, login: &OmeroLogin) -> Result<String> {
    let token: WireData<String> = client
        .get(format!("{}/api/v0/token/", base_url))
        .send()
        .await
        .context("Failed to request CSRF token")?
        .error_for_status()
        .context("CSRF token request was rejected")?
        .json()
        .await
        .context("Failed to parse CSRF token")?;

    let response: WireLogin = client
        .post(format!("{}/api/v0/login/", base_url))
        .header("X-CSRFToken", &token.data)
        .header("Referer", base_url)
        .form(&[
            ("server", login.server_id.to_string()),
            ("username", login.username.clone()),
            ("password", login.password.clone()),
        ])
        .send()
        .await
        .context("Failed to send login request")?
        .json()
        .await
        .context("Failed to parse login response")?;

    if !response.success {
        bail!(
            "Login as {} failed: {}",
            login.username,
            response.message.unwrap_or_else(|| "no reason given".to_string())
        );
    }

    Ok(token.data)
}

/// Pack the non-transparent pixels of a rendered mask into bits
///
/// The image must have the declared width and height of the mask.
fn png_mask_bytes(png: &[u8], width: f64, height: f64) -> Result<Vec<u8>> {
    let rgba = image::load_from_memory(png)
        .context("Failed to decode mask image")?
        .to_rgba8();

    if rgba.width() as f64 != width || rgba.height() as f64 != height {
        bail!(
            "Mask image is {}x{} but the mask is {}x{}",
            rgba.width(),
            rgba.height(),
            width,
            height
        );
    }

    let data = rgba.pixels().map(|pixel| (pixel.0[3] > 0) as u8).collect();
    let grid = BinaryGrid::new(rgba.width() as usize, rgba.height() as usize, data)
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(encode_bitmask(&grid))
}

fn schema_type(name: &str) -> String {
    format!("{}#{}", OME_SCHEMA, name)
}

/// Encode a new ROI in the JSON API object format
fn roi_to_json(roi: &Roi) -> Value {
    let shapes: Vec<Value> = roi.shapes.iter().map(shape_to_json).collect();

    json!({
        "@type": schema_type(ROI_TYPE),
        "Image": { "@type": schema_type(IMAGE_TYPE), "@id": roi.image_id },
        "shapes": shapes,
    })
}

fn shape_to_json(shape: &Shape) -> Value {
    let mut value = match shape {
        Shape::Polygon(polygon) => json!({
            "Points": polygon.points,
            "TheZ": polygon.the_z,
            "TheT": polygon.the_t,
            "StrokeColor": polygon.stroke_color,
        }),
        Shape::Mask(mask) => json!({
            "X": mask.x,
            "Y": mask.y,
            "Width": mask.width,
            "Height": mask.height,
            "TheZ": mask.the_z,
            "TheT": mask.the_t,
            "TheC": mask.the_c,
            "Bytes": BASE64.encode(&mask.bytes),
        }),
        Shape::Other { .. } => json!({}),
    };

    if let Value::Object(fields) = &mut value {
        fields.retain(|_, v| !v.is_null());
        fields.insert("@type".to_string(), json!(schema_type(shape.kind().type_name())));
    }

    value
}

#[derive(Debug, Deserialize)]
struct WireData<T> {
    data: T,
}

/// A list response read only for its size
#[derive(Debug, Deserialize)]
struct WirePage {
    #[serde(default)]
    data: Vec<IgnoredAny>,
    #[serde(default)]
    meta: Option<WireMeta>,
}

impl WirePage {
    fn has_items(&self) -> bool {
        match self.meta.as_ref().and_then(|meta| meta.total_count) {
            Some(n) => n > 0,
            None => !self.data.is_empty(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMeta {
    #[serde(rename = "totalCount", default)]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireLogin {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSaved {
    #[serde(rename = "@id")]
    id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WirePixels {
    #[serde(rename = "SizeX", default)]
    size_x: usize,
    #[serde(rename = "SizeY", default)]
    size_y: usize,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    #[serde(rename = "@id")]
    id: i64,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Pixels", default)]
    pixels: Option<WirePixels>,
}

impl From<WireImage> for ImageInfo {
    fn from(wire: WireImage) -> Self {
        let (size_x, size_y) = wire
            .pixels
            .map(|pixels| (pixels.size_x, pixels.size_y))
            .unwrap_or((0, 0));

        ImageInfo {
            id: wire.id,
            name: wire.name.unwrap_or_default(),
            size_x,
            size_y,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireRoi {
    #[serde(rename = "@id")]
    id: Option<i64>,
    #[serde(default)]
    shapes: Vec<WireShape>,
}

#[derive(Debug, Deserialize)]
struct WireShape {
    #[serde(rename = "@type")]
    kind: String,
    #[serde(rename = "@id", default)]
    id: Option<i64>,
    #[serde(rename = "TheT", default)]
    the_t: Option<i32>,
    #[serde(rename = "TheC", default)]
    the_c: Option<i32>,
    #[serde(rename = "TheZ", default)]
    the_z: Option<i32>,
    #[serde(rename = "X", default)]
    x: Option<f64>,
    #[serde(rename = "Y", default)]
    y: Option<f64>,
    #[serde(rename = "Width", default)]
    width: Option<f64>,
    #[serde(rename = "Height", default)]
    height: Option<f64>,
    #[serde(rename = "Bytes", default)]
    bytes: Option<String>,
    #[serde(rename = "Points", default)]
    points: Option<String>,
    #[serde(rename = "StrokeColor", default)]
    stroke_color: Option<i32>,
}

#[cfg(test)]
mod test {

    use super::*;

    fn login(server: &str) -> OmeroLogin {
        OmeroLogin {
            server: server.to_string(),
            username: "user".to_string(),
            password: "secret".to_string(),
            server_id: 1,
        }
    }

    #[test]
    fn test_base_url() {
        assert_eq!(login("idr.openmicroscopy.org").base_url(), "https://idr.openmicroscopy.org");
        assert_eq!(login("http://localhost:4080/").base_url(), "http://localhost:4080");
        assert_eq!(login(" https://example.org/omero ").base_url(), "https://example.org/omero");
    }

    #[test]
    fn test_polygon_roi_json() {
        let mut roi = Roi::new(42);
        roi.add_shape(Shape::Polygon(Polygon {
            id: None,
            the_t: Some(0),
            the_z: None,
            points: "1.0,2.0, 3.0,4.0".to_string(),
            stroke_color: Some(-1),
        }));

        let value = roi_to_json(&roi);

        assert_eq!(value["@type"], json!(format!("{}#ROI", OME_SCHEMA)));
        assert_eq!(value["Image"]["@id"], json!(42));

        let shape = &value["shapes"][0];
        assert_eq!(shape["@type"], json!(format!("{}#Polygon", OME_SCHEMA)));
        assert_eq!(shape["Points"], json!("1.0,2.0, 3.0,4.0"));
        assert_eq!(shape["TheT"], json!(0));
        assert_eq!(shape["StrokeColor"], json!(-1));
        assert!(shape.get("TheZ").is_none());
    }

    #[test]
    fn test_mask_json_bytes() {
        let mut roi = Roi::new(1);
        roi.add_shape(Shape::Mask(Mask::from_grid(&BinaryGrid::ones(4, 2), 3.0, 4.0)));

        let shape = &roi_to_json(&roi)["shapes"][0];
        assert_eq!(shape["Bytes"], json!(BASE64.encode([0xFFu8])));
        assert_eq!(shape["Width"], json!(4.0));
    }

    #[test]
    fn test_parse_roi_page() {
        let body = json!({
            "data": [{
                "@id": 7,
                "shapes": [
                    {
                        "@type": format!("{}#Mask", OME_SCHEMA),
                        "@id": 70,
                        "TheZ": 2,
                        "X": 1.0, "Y": 2.0, "Width": 4.0, "Height": 2.0,
                        "Bytes": BASE64.encode([0b1010_1100u8])
                    },
                    { "@type": format!("{}#Rectangle", OME_SCHEMA), "@id": 71 }
                ]
            }],
            "meta": { "totalCount": 1 }
        });

        let page: WireData<Vec<WireRoi>> = serde_json::from_value(body).unwrap();
        let shape = &page.data[0].shapes[0];

        assert_eq!(page.data[0].id, Some(7));
        assert_eq!(ShapeKind::from_type_name(&shape.kind), ShapeKind::Mask);
        assert_eq!(shape.the_z, Some(2));
        assert_eq!(shape.the_t, None);
        assert_eq!(BASE64.decode(shape.bytes.as_ref().unwrap()).unwrap(), vec![0b1010_1100u8]);
        assert_eq!(
            ShapeKind::from_type_name(&page.data[0].shapes[1].kind),
            ShapeKind::Other("Rectangle".to_string())
        );
    }

    #[test]
    fn test_existence_page_skips_shape_payloads() {
        // Mask without bytes or id cannot be turned into a shape
        let body = json!({
            "data": [{
                "@id": 7,
                "shapes": [{ "@type": format!("{}#Mask", OME_SCHEMA), "Width": 4.0 }]
            }],
            "meta": { "totalCount": 3, "limit": 1 }
        });

        let page: WirePage = serde_json::from_value(body).unwrap();
        assert!(page.has_items());

        let page: WirePage = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(!page.has_items());

        let page: WirePage =
            serde_json::from_value(json!({ "data": [], "meta": { "totalCount": 0 } })).unwrap();
        assert!(!page.has_items());
    }

    fn rendered_png(width: u32, height: u32) -> Vec<u8> {
        let rgba = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([255, 255, 255, if x == y { 255 } else { 0 }])
        });

        let mut png = Vec::new();
        rgba.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    #[test]
    fn test_png_mask_bytes() {
        let bytes = png_mask_bytes(&rendered_png(4, 2), 4.0, 2.0).unwrap();
        assert_eq!(bytes, vec![0b1000_0100]);
    }

    #[test]
    fn test_png_mask_size_mismatch() {
        let err = png_mask_bytes(&rendered_png(4, 2), 2.0, 4.0).unwrap_err();
        assert!(format!("{:#}", err).contains("4x2"));

        assert!(png_mask_bytes(&rendered_png(4, 2), 4.0, 3.0).is_err());
    }

    #[test]
    fn test_parse_image() {
        let body = json!({
            "data": {
                "@id": 3,
                "Name": "cells.tif",
                "Pixels": { "SizeX": 512, "SizeY": 256, "SizeZ": 1 }
            }
        });

        let response: WireData<WireImage> = serde_json::from_value(body).unwrap();
        let image: ImageInfo = response.data.into();

        assert_eq!(image, ImageInfo::new(3, "cells.tif", 512, 256));
    }

    #[test]
    fn test_connect_unreachable_server() {
        let result = OmeroClient::connect(&login("http://127.0.0.1:9"));
        assert!(matches!(result, Err(RoiCopyError::RemoteOperationError(_))));
    }
}

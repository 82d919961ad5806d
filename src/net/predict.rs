use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::magic_pen::{Crop, PredictParams};
use crate::net::NetError;

/// Wire form of the batched prediction request: the crop sequence plus the
/// tuning knobs, flattened the way the service expects them.
#[derive(Serialize)]
struct PredictRequest<'a> {
    crops: &'a [Crop],
    mode: &'a str,
    apply_morphology: bool,
    morph_kernel_size: u32,
    morph_iterations: u32,
    apply_dbscan: bool,
    db_eps: u32,
    db_min_samples: u32,
    sensitivity: u32,
}

/// Wire form of the single-crop diagnostic request.
#[derive(Serialize)]
struct SingleCropRequest<'a> {
    image_base64: &'a str,
    #[serde(rename = "centerX")]
    center_x: i32,
    #[serde(rename = "centerY")]
    center_y: i32,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub merged_mask_base64: Option<String>,
    #[serde(default)]
    pub num_crops_processed: Option<u32>,
}

/// Blocking client for the crop-prediction endpoint. Lives on a worker
/// thread; the UI never blocks on it.
#[derive(Clone)]
pub struct PredictClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl PredictClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("reqwest client"),
        }
    }

    /// Send one batched request for all crops of a stroke. Returns the
    /// parsed response only when the service reports success.
    pub fn predict_crops(
        &self,
        crops: &[Crop],
        params: &PredictParams,
    ) -> Result<PredictResponse, NetError> {
        let body = PredictRequest {
            crops,
            mode: &params.mode,
            apply_morphology: params.apply_morphology,
            morph_kernel_size: params.morph_kernel_size,
            morph_iterations: params.morph_iterations,
            apply_dbscan: params.apply_dbscan,
            db_eps: params.db_eps,
            db_min_samples: params.db_min_samples,
            sensitivity: params.sensitivity,
        };
        log::info!("sending {} crops for prediction", crops.len());
        let response = self
            .http
            .post(format!("{}/magic_pen/predict_crops", self.base_url))
            .json(&body)
            .send()?;
        Self::parse(response)
    }

    /// Diagnostic variant: predict one crop in isolation.
    pub fn predict_single_crop(&self, crop: &Crop) -> Result<PredictResponse, NetError> {
        let body = SingleCropRequest {
            image_base64: &crop.image_base64,
            center_x: crop.center_x,
            center_y: crop.center_y,
            width: crop.width,
            height: crop.height,
        };
        let response = self
            .http
            .post(format!("{}/magic_pen/predict_single_crop", self.base_url))
            .json(&body)
            .send()?;
        Self::parse(response)
    }

    fn parse(response: reqwest::blocking::Response) -> Result<PredictResponse, NetError> {
        if !response.status().is_success() {
            return Err(NetError::Status(response.status()));
        }
        let parsed: PredictResponse = response.json()?;
        if parsed.status != "success" {
            return Err(NetError::Prediction(
                parsed
                    .message
                    .unwrap_or_else(|| "prediction failed".to_string()),
            ));
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_crop() -> Crop {
        Crop {
            id: 3,
            image_base64: "data:image/png;base64,AAAA".to_string(),
            center_x: 120,
            center_y: -4,
            width: 200,
            height: 200,
            canvas_width: 800,
            canvas_height: 600,
            timestamp: 1234567890,
            line_distance: 150.5,
        }
    }

    #[test]
    fn crop_serializes_with_wire_field_names() {
        let value = serde_json::to_value(sample_crop()).unwrap();
        assert_eq!(value["centerX"], 120);
        assert_eq!(value["centerY"], -4);
        assert_eq!(value["canvas_width"], 800);
        assert_eq!(value["line_distance"], 150.5);
        assert!(value.get("center_x").is_none());
    }

    #[test]
    fn request_carries_crops_and_params() {
        let crops = vec![sample_crop()];
        let params = PredictParams::default();
        let body = PredictRequest {
            crops: &crops,
            mode: &params.mode,
            apply_morphology: params.apply_morphology,
            morph_kernel_size: params.morph_kernel_size,
            morph_iterations: params.morph_iterations,
            apply_dbscan: params.apply_dbscan,
            db_eps: params.db_eps,
            db_min_samples: params.db_min_samples,
            sensitivity: params.sensitivity,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["mode"], "normal");
        assert_eq!(value["apply_morphology"], true);
        assert_eq!(value["morph_kernel_size"], 3);
        assert_eq!(value["db_eps"], 10);
        assert_eq!(value["sensitivity"], 2);
        assert_eq!(value["crops"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn single_crop_request_uses_wire_field_names() {
        let crop = sample_crop();
        let body = SingleCropRequest {
            image_base64: &crop.image_base64,
            center_x: crop.center_x,
            center_y: crop.center_y,
            width: crop.width,
            height: crop.height,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["centerX"], 120);
        assert_eq!(value["centerY"], -4);
        assert_eq!(value["image_base64"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn response_parses_optional_fields() {
        let full: PredictResponse = serde_json::from_str(
            r#"{"status":"success","merged_mask_base64":"data:image/png;base64,XYZ",
                "num_crops_processed":5,"message":"ok"}"#,
        )
        .unwrap();
        assert_eq!(full.status, "success");
        assert_eq!(full.num_crops_processed, Some(5));
        assert!(full.merged_mask_base64.is_some());

        let bare: PredictResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(bare.status, "error");
        assert!(bare.merged_mask_base64.is_none());
        assert!(bare.message.is_none());
    }
}

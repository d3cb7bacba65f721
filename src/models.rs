use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::geometry::NaturalRect;
use crate::inference::InferenceError;

// Gateway request: the whole image plus a selection in natural pixels
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ClassifyRequest {
    pub image_base64: String,
    #[serde(rename = "box")]
    pub selection: NaturalRect,
}

// One ranked label from the remote scorer
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

// Gateway response
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ClassifyResponse {
    pub predictions: Vec<Prediction>,
    // the selection actually cropped, after clamping
    #[serde(rename = "box")]
    pub selection: NaturalRect,
}

// Inference job - cropped image + response channel
pub struct InferenceJob {
    pub crop: Vec<u8>,
    pub response_tx: oneshot::Sender<Result<Vec<Prediction>, InferenceError>>,
}

use serde::{Deserialize, Serialize};

/// Body of a property comparison request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PropertyValuesEqualRequest {
    pub name: String,
    pub previous: String,
    pub current: String,
}

/// Answer to [`PropertyValuesEqualRequest`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyValuesEqualResponse {
    pub equals: bool,
}

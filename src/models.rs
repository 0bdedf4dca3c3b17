use serde::Deserialize;

#[derive(Deserialize)]
pub struct TreeQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub legacy: bool,
}

#[derive(Deserialize)]
pub struct ToggleRequest {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub path: String,
    #[serde(default)]
    pub is_folder: bool,
}

#[derive(Deserialize)]
pub struct ContextRequest {
    pub path: String,
}

#[derive(Deserialize)]
pub struct TerminalRequest {
    pub input: String,
}

#[derive(Deserialize)]
pub struct PreferenceRequest {
    pub key: String,
    pub value: String,
}

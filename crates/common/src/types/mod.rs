use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Health {
    pub status: String,
    pub app: String,
}

impl Health {
    pub fn up(app: &str) -> Self {
        Self { status: "up".into(), app: app.into() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Pong {
    pub status: String,
}

impl Default for Pong {
    fn default() -> Self {
        Self { status: "pong".into() }
    }
}

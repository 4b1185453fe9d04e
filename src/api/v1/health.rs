use crate::api::v1::{ok_resp, JSONResp};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    message: &'static str,
}

#[get("/health")]
pub fn check() -> JSONResp<Health> {
    ok_resp(Health { message: "ok" })
}

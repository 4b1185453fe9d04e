use crate::{
    api::v1::{ok_resp, JSONResp},
    db::{tags, DbConn},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TagsResp {
    tags: Vec<String>,
}

#[get("/tags")]
pub async fn list(conn: DbConn) -> JSONResp<TagsResp> {
    let tags = conn.run(|c| tags::all(c)).await?;
    ok_resp(TagsResp { tags })
}

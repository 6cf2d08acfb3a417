use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct LoginData {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdatePasswordData {
    pub(crate) password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewCommentData {
    pub(crate) post_id: i64,
    pub(crate) content: String,
}

#[derive(Deserialize)]
pub(crate) struct UpdateCommentData {
    pub(crate) content: String,
}

use crate::routes::{chats, health, users};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "chatsum-server",
    description = "Chat storage and conversation summarization API",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(chats::ChatsApi::openapi());
    root.merge(users::UsersApi::openapi());
    root
}

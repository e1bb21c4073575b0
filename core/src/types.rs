//! Data types exchanged with the Bot API.
//!
//! # Design
//! Every type maps bidirectionally to its wire shape through serde: fields
//! keep the documented wire names, optional fields are `Option` with
//! `skip_serializing_if` so an unset field is omitted from the payload
//! rather than sent as `null`, and an absent wire key decodes to `None`.
//! `Option<Vec<_>>` keeps "empty list" and "no list" distinguishable in
//! both directions. Types that the wire models as one-of-several shapes
//! (chat ids, reply markup, dual-return results) are serde unions.

use serde::{Deserialize, Serialize, Serializer};

use crate::multipart::{Part, PartValue};

/// A user or bot account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// A chat: private conversation, group, supergroup, or channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<ChatPhoto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<ChatPermissions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPhoto {
    pub small_file_id: String,
    pub small_file_unique_id: String,
    pub big_file_id: String,
    pub big_file_unique_id: String,
}

/// A message, with the subset of attachment fields this client models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub date: i64,
    pub chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_from: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<MessageEntity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Audio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_note: Option<VideoNote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<Venue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_chat_members: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_chat_member: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_message: Option<Box<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

/// Wrapper returned by methods that only report the new message's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId {
    pub message_id: i64,
}

/// One formatting entity in message text (mention, link, code span, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i64,
    pub height: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub file_unique_id: String,
    pub duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PhotoSize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PhotoSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i64,
    pub height: i64,
    pub duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PhotoSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoNote {
    pub file_id: String,
    pub file_unique_id: String,
    pub length: i64,
    pub duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PhotoSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub file_id: String,
    pub file_unique_id: String,
    pub duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcard: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_period: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proximity_alert_radius: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub location: Location,
    pub title: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foursquare_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foursquare_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfilePhotos {
    pub total_count: i64,
    pub photos: Vec<Vec<PhotoSize>>,
}

/// A file ready to be downloaded via the file endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// One incoming event, fetched by long polling or pushed to a webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookInfo {
    pub url: String,
    pub has_custom_certificate: bool,
    pub pending_update_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Scope a command list applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotCommandScope {
    Default,
    AllPrivateChats,
    AllGroupChats,
    AllChatAdministrators,
    Chat { chat_id: ChatId },
    ChatAdministrators { chat_id: ChatId },
    ChatMember { chat_id: ChatId, user_id: i64 },
}

/// A button press on an inline keyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    pub chat_instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Membership record, discriminated by the wire `status` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChatMember {
    Creator {
        user: User,
        is_anonymous: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        custom_title: Option<String>,
    },
    Administrator {
        user: User,
        can_be_edited: bool,
        is_anonymous: bool,
        can_manage_chat: bool,
        can_delete_messages: bool,
        can_restrict_members: bool,
        can_promote_members: bool,
        can_change_info: bool,
        can_invite_users: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        can_pin_messages: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        custom_title: Option<String>,
    },
    Member {
        user: User,
    },
    Restricted {
        user: User,
        is_member: bool,
        until_date: i64,
    },
    Left {
        user: User,
    },
    Kicked {
        user: User,
        until_date: i64,
    },
}

impl ChatMember {
    pub fn user(&self) -> &User {
        match self {
            ChatMember::Creator { user, .. }
            | ChatMember::Administrator { user, .. }
            | ChatMember::Member { user }
            | ChatMember::Restricted { user, .. }
            | ChatMember::Left { user }
            | ChatMember::Kicked { user, .. } => user,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatPermissions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_media_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_polls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_other_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_add_web_page_previews: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_change_info: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_invite_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_pin_messages: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
    pub creator: User,
    pub creates_join_request: bool,
    pub is_primary: bool,
    pub is_revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_join_request_count: Option<i64>,
}

/// Extra error-envelope data: migration hints and flood-control delays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_inline_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_inline_query_current_chat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_persistent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_time_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_field_placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_contact: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_location: Option<bool>,
}

/// Instruction to remove a previously sent reply keyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyKeyboardRemove {
    /// Always `true` on the wire.
    pub remove_keyboard: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
}

impl ReplyKeyboardRemove {
    pub fn new() -> Self {
        Self {
            remove_keyboard: true,
            selective: None,
        }
    }
}

impl Default for ReplyKeyboardRemove {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceReply {
    /// Always `true` on the wire.
    pub force_reply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_field_placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
}

impl ForceReply {
    pub fn new() -> Self {
        Self {
            force_reply: true,
            input_field_placeholder: None,
            selective: None,
        }
    }
}

impl Default for ForceReply {
    fn default() -> Self {
        Self::new()
    }
}

/// Any of the keyboard shapes a send method accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    InlineKeyboard(InlineKeyboardMarkup),
    ReplyKeyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
    ForceReply(ForceReply),
}

impl From<InlineKeyboardMarkup> for ReplyMarkup {
    fn from(markup: InlineKeyboardMarkup) -> Self {
        ReplyMarkup::InlineKeyboard(markup)
    }
}

impl From<ReplyKeyboardMarkup> for ReplyMarkup {
    fn from(markup: ReplyKeyboardMarkup) -> Self {
        ReplyMarkup::ReplyKeyboard(markup)
    }
}

impl From<ReplyKeyboardRemove> for ReplyMarkup {
    fn from(markup: ReplyKeyboardRemove) -> Self {
        ReplyMarkup::Remove(markup)
    }
}

impl From<ForceReply> for ReplyMarkup {
    fn from(markup: ForceReply) -> Self {
        ReplyMarkup::ForceReply(markup)
    }
}

/// Chat address: numeric id, or `@channelusername`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Integer(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Integer(id)
    }
}

impl From<&str> for ChatId {
    fn from(username: &str) -> Self {
        ChatId::Username(username.to_string())
    }
}

impl From<String> for ChatId {
    fn from(username: String) -> Self {
        ChatId::Username(username)
    }
}

/// Text formatting modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    MarkdownV2,
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

/// Chat action shown as the "bot is ..." status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
    UploadPhoto,
    RecordVideo,
    UploadVideo,
    RecordVoice,
    UploadVoice,
    UploadDocument,
    ChooseSticker,
    FindLocation,
    RecordVideoNote,
    UploadVideoNote,
}

/// Result of edit methods: the edited message for chat messages, `true`
/// for inline-keyboard messages the bot cannot read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageOrBool {
    Message(Box<Message>),
    Bool(bool),
}

/// A file to send: reuse by id, fetch by URL, or upload raw bytes.
///
/// The id and URL forms serialize to their string; an upload serializes to
/// an `attach://<file_name>` reference and travels as a binary multipart
/// part alongside the flattened fields.
#[derive(Debug, Clone, PartialEq)]
pub enum InputFile {
    FileId(String),
    Url(String),
    Upload { file_name: String, bytes: Vec<u8> },
}

impl InputFile {
    pub fn file_id(id: impl Into<String>) -> Self {
        InputFile::FileId(id.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        InputFile::Url(url.into())
    }

    pub fn upload(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        InputFile::Upload {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// The binary part backing an `attach://` reference, if this is an upload.
    pub(crate) fn upload_part(&self) -> Option<Part> {
        match self {
            InputFile::Upload { file_name, bytes } => Some(Part {
                name: file_name.clone(),
                value: PartValue::File {
                    file_name: file_name.clone(),
                    bytes: bytes.clone(),
                },
            }),
            _ => None,
        }
    }
}

impl Serialize for InputFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            InputFile::FileId(id) => serializer.serialize_str(id),
            InputFile::Url(url) => serializer.serialize_str(url),
            InputFile::Upload { file_name, .. } => {
                serializer.serialize_str(&format!("attach://{file_name}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        User {
            id: 42,
            is_bot: false,
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
            username: Some("ada".to_string()),
            language_code: Some("en".to_string()),
            is_premium: Some(true),
        }
    }

    fn sample_chat() -> Chat {
        Chat {
            id: -100123,
            kind: ChatType::Supergroup,
            title: Some("engine room".to_string()),
            username: None,
            first_name: None,
            last_name: None,
            photo: None,
            description: None,
            invite_link: None,
            permissions: None,
        }
    }

    #[test]
    fn user_roundtrips_fully_populated() {
        let user = sample_user();
        let value = serde_json::to_value(&user).unwrap();
        let back: User = serde_json::from_value(value).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn user_unset_fields_are_omitted() {
        let user = User {
            id: 1,
            is_bot: true,
            first_name: "bot".to_string(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: None,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value, json!({"id": 1, "is_bot": true, "first_name": "bot"}));
    }

    #[test]
    fn user_absent_keys_decode_to_none() {
        let user: User =
            serde_json::from_value(json!({"id": 7, "is_bot": false, "first_name": "x"})).unwrap();
        assert!(user.last_name.is_none());
        assert!(user.username.is_none());
    }

    #[test]
    fn user_missing_required_key_fails() {
        let result: Result<User, _> = serde_json::from_value(json!({"id": 7, "is_bot": false}));
        assert!(result.is_err());
    }

    #[test]
    fn absent_value_propagates_through_option() {
        let user: Option<User> = serde_json::from_value(json!(null)).unwrap();
        assert!(user.is_none());
    }

    #[test]
    fn message_roundtrips_with_nested_values() {
        let message = Message {
            message_id: 9,
            from: Some(sample_user()),
            date: 1_650_000_000,
            chat: sample_chat(),
            forward_from: None,
            forward_date: None,
            reply_to_message: None,
            edit_date: None,
            text: Some("héllo, 世界".to_string()),
            entities: Some(vec![MessageEntity {
                kind: "bold".to_string(),
                offset: 0,
                length: 5,
                url: None,
                user: None,
                language: None,
            }]),
            audio: None,
            document: None,
            photo: None,
            video: None,
            video_note: None,
            voice: None,
            caption: None,
            contact: None,
            location: None,
            venue: None,
            new_chat_members: None,
            left_chat_member: None,
            pinned_message: None,
            reply_markup: None,
        };
        let value = serde_json::to_value(&message).unwrap();
        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn empty_list_stays_distinct_from_absent_list() {
        let with_empty: Message = serde_json::from_value(json!({
            "message_id": 1,
            "date": 0,
            "chat": {"id": 5, "type": "private"},
            "entities": [],
        }))
        .unwrap();
        assert_eq!(with_empty.entities, Some(vec![]));

        let without: Message = serde_json::from_value(json!({
            "message_id": 1,
            "date": 0,
            "chat": {"id": 5, "type": "private"},
        }))
        .unwrap();
        assert_eq!(without.entities, None);

        let value = serde_json::to_value(&with_empty).unwrap();
        assert_eq!(value["entities"], json!([]));
        let value = serde_json::to_value(&without).unwrap();
        assert!(value.get("entities").is_none());
    }

    #[test]
    fn chat_id_serializes_untagged() {
        assert_eq!(serde_json::to_value(ChatId::from(99)).unwrap(), json!(99));
        assert_eq!(
            serde_json::to_value(ChatId::from("@channel")).unwrap(),
            json!("@channel")
        );
    }

    #[test]
    fn chat_member_discriminates_on_status() {
        let member: ChatMember = serde_json::from_value(json!({
            "status": "kicked",
            "user": {"id": 3, "is_bot": false, "first_name": "t"},
            "until_date": 1700000000,
        }))
        .unwrap();
        assert!(matches!(member, ChatMember::Kicked { until_date: 1_700_000_000, .. }));
        assert_eq!(member.user().id, 3);

        let value = serde_json::to_value(&member).unwrap();
        assert_eq!(value["status"], "kicked");
    }

    #[test]
    fn bot_command_scope_is_type_tagged() {
        let scope = BotCommandScope::Chat {
            chat_id: ChatId::from(12),
        };
        let value = serde_json::to_value(&scope).unwrap();
        assert_eq!(value, json!({"type": "chat", "chat_id": 12}));

        let plain = serde_json::to_value(BotCommandScope::Default).unwrap();
        assert_eq!(plain, json!({"type": "default"}));
    }

    #[test]
    fn message_or_bool_decodes_both_shapes() {
        let as_bool: MessageOrBool = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(as_bool, MessageOrBool::Bool(true));

        let as_message: MessageOrBool = serde_json::from_value(json!({
            "message_id": 4,
            "date": 0,
            "chat": {"id": 1, "type": "private"},
            "text": "edited",
        }))
        .unwrap();
        match as_message {
            MessageOrBool::Message(message) => assert_eq!(message.text.as_deref(), Some("edited")),
            MessageOrBool::Bool(_) => panic!("expected message"),
        }
    }

    #[test]
    fn reply_markup_serializes_inner_shape() {
        let markup = ReplyMarkup::from(InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: "go".to_string(),
                url: None,
                callback_data: Some("go:1".to_string()),
                switch_inline_query: None,
                switch_inline_query_current_chat: None,
                pay: None,
            }]],
        });
        let value = serde_json::to_value(&markup).unwrap();
        assert_eq!(
            value,
            json!({"inline_keyboard": [[{"text": "go", "callback_data": "go:1"}]]})
        );

        let remove = ReplyMarkup::from(ReplyKeyboardRemove::new());
        assert_eq!(
            serde_json::to_value(&remove).unwrap(),
            json!({"remove_keyboard": true})
        );
    }

    #[test]
    fn parse_mode_wire_names() {
        assert_eq!(serde_json::to_value(ParseMode::Html).unwrap(), json!("HTML"));
        assert_eq!(
            serde_json::to_value(ParseMode::MarkdownV2).unwrap(),
            json!("MarkdownV2")
        );
    }

    #[test]
    fn chat_action_wire_names() {
        assert_eq!(
            serde_json::to_value(ChatAction::UploadDocument).unwrap(),
            json!("upload_document")
        );
    }

    #[test]
    fn input_file_serializes_to_reference_strings() {
        assert_eq!(
            serde_json::to_value(InputFile::file_id("AgAD")).unwrap(),
            json!("AgAD")
        );
        assert_eq!(
            serde_json::to_value(InputFile::url("https://example.com/cat.png")).unwrap(),
            json!("https://example.com/cat.png")
        );
        assert_eq!(
            serde_json::to_value(InputFile::upload("cat.png", vec![1, 2])).unwrap(),
            json!("attach://cat.png")
        );
    }

    #[test]
    fn input_file_upload_part_only_for_uploads() {
        assert!(InputFile::file_id("AgAD").upload_part().is_none());
        let part = InputFile::upload("cat.png", vec![1, 2]).upload_part().unwrap();
        assert_eq!(part.name, "cat.png");
        assert_eq!(
            part.value,
            PartValue::File {
                file_name: "cat.png".to_string(),
                bytes: vec![1, 2],
            }
        );
    }

    #[test]
    fn update_roundtrips_with_callback_query() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 1000,
            "callback_query": {
                "id": "cq1",
                "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
                "chat_instance": "ci",
                "data": "go:1",
            }
        }))
        .unwrap();
        let query = update.callback_query.as_ref().unwrap();
        assert_eq!(query.data.as_deref(), Some("go:1"));
        assert!(update.message.is_none());

        let value = serde_json::to_value(&update).unwrap();
        let back: Update = serde_json::from_value(value).unwrap();
        assert_eq!(back, update);
    }
}

use serde::{Deserialize, Serialize};

use crate::domain::{
    ApiKey, BatchSend, CarrierMessageId, DeliveryReceipt, MessageText, Mobile, ReceiptStatus,
    YunpianBatchResponse, YunpianCode, YunpianSendResult,
};
use crate::transport::money::TransportMoney;

pub const DEFAULT_API_BASE: &str = "https://sms.yunpian.com/v2";
pub const SINGLE_SEND_PATH: &str = "/sms/single_send.json";
pub const BATCH_SEND_PATH: &str = "/sms/batch_send.json";
pub const MULTI_SEND_PATH: &str = "/sms/multi_send.json";

const RECEIPT_FORM_FIELD: &str = "sms_status";
const RECEIVE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RECEIPT_AT_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fee is not a decimal amount")]
    InvalidFee,

    #[error("status push has no `sms_status` payload")]
    MissingReceiptPayload,

    #[error("receipt entry is missing `{field}`")]
    MissingReceiptField { field: &'static str },

    #[error("invalid receipt time: {value:?}")]
    InvalidReceiptTime { value: String },
}

/// JSON body shared by `single_send`, `batch_send` and `multi_send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendBody {
    pub apikey: String,
    pub mobile: String,
    pub text: String,
    pub callback_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TransportSid {
    Number(i64),
    String(String),
}

impl TransportSid {
    fn into_message_id(self) -> Option<CarrierMessageId> {
        match self {
            Self::Number(value) => CarrierMessageId::non_empty(&value.to_string()),
            Self::String(value) => CarrierMessageId::non_empty(&value),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SendJsonResponse {
    code: i32,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    count: u32,
    #[serde(default)]
    fee: Option<TransportMoney>,
    #[serde(default)]
    mobile: Option<String>,
    #[serde(default)]
    sid: Option<TransportSid>,
}

#[derive(Debug, Clone, Deserialize)]
struct BatchJsonResponse {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    total_count: u32,
    #[serde(default)]
    total_fee: Option<TransportMoney>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    data: Vec<SendJsonResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReceiptJsonEnvelope {
    #[serde(default)]
    sms_status: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReceiptJsonEntry {
    #[serde(default)]
    sid: Option<TransportSid>,
    #[serde(default)]
    user_receive_time: Option<String>,
    #[serde(default)]
    mobile: Option<String>,
    #[serde(default)]
    report_status: String,
}

/// One undecoded entry of a status push; decoding is deferred so a bad entry only fails itself.
#[derive(Debug, Clone)]
pub struct ReceiptEntry(serde_json::Value);

impl ReceiptEntry {
    pub fn decode(self) -> Result<DeliveryReceipt, TransportError> {
        let entry: ReceiptJsonEntry = serde_json::from_value(self.0)?;

        let message_id = entry
            .sid
            .and_then(TransportSid::into_message_id)
            .ok_or(TransportError::MissingReceiptField { field: "sid" })?;
        let mobile = entry
            .mobile
            .and_then(|value| Mobile::new(value).ok())
            .ok_or(TransportError::MissingReceiptField {
                field: Mobile::FIELD,
            })?;

        Ok(DeliveryReceipt {
            message_id,
            mobile,
            status: ReceiptStatus::from_yunpian(&entry.report_status),
            receipt_at: receipt_at(entry.user_receive_time.as_deref().unwrap_or_default())?,
        })
    }
}

fn receipt_at(value: &str) -> Result<String, TransportError> {
    let value = value.trim();
    if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(value, RECEIVE_TIME_FORMAT) {
        return Ok(parsed.format(RECEIPT_AT_FORMAT).to_string());
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.format(RECEIPT_AT_FORMAT).to_string())
        .map_err(|_| TransportError::InvalidReceiptTime {
            value: value.to_owned(),
        })
}

fn send_body(api_key: &ApiKey, mobile: String, text: String, callback_url: &str) -> SendBody {
    SendBody {
        apikey: api_key.as_str().to_owned(),
        mobile,
        text,
        callback_url: callback_url.to_owned(),
    }
}

pub fn encode_single_send(
    api_key: &ApiKey,
    mobile: &Mobile,
    text: &MessageText,
    callback_url: &str,
) -> SendBody {
    send_body(
        api_key,
        mobile.raw().to_owned(),
        text.as_str().to_owned(),
        callback_url,
    )
}

/// Encode a batch. Same-content batches go to `batch_send`; per-recipient batches go to
/// `multi_send` with every content URL-escaped and comma-joined in recipient order.
pub fn encode_batch_send(
    api_key: &ApiKey,
    batch: &BatchSend,
    callback_url: &str,
) -> (&'static str, SendBody) {
    match batch {
        BatchSend::SameContent(same) => (
            BATCH_SEND_PATH,
            send_body(
                api_key,
                Mobile::join(same.recipients()),
                same.text().as_str().to_owned(),
                callback_url,
            ),
        ),
        BatchSend::PerRecipient(per_recipient) => {
            let messages = per_recipient.messages();
            let mobiles = messages
                .iter()
                .map(|(mobile, _)| mobile.raw())
                .collect::<Vec<_>>()
                .join(",");
            let texts = messages
                .iter()
                .map(|(_, text)| {
                    url::form_urlencoded::byte_serialize(text.as_str().as_bytes())
                        .collect::<String>()
                })
                .collect::<Vec<_>>()
                .join(",");
            (
                MULTI_SEND_PATH,
                send_body(api_key, mobiles, texts, callback_url),
            )
        }
    }
}

fn fee_minor(fee: Option<&TransportMoney>) -> Result<i64, TransportError> {
    match fee {
        Some(fee) => fee.to_minor_units().ok_or(TransportError::InvalidFee),
        None => Ok(0),
    }
}

fn send_result(parsed: SendJsonResponse) -> Result<YunpianSendResult, TransportError> {
    Ok(YunpianSendResult {
        code: YunpianCode::new(parsed.code),
        msg: parsed.msg,
        count: parsed.count,
        fee_minor: fee_minor(parsed.fee.as_ref())?,
        message_id: parsed.sid.and_then(TransportSid::into_message_id),
        mobile: parsed.mobile.and_then(|value| Mobile::new(value).ok()),
    })
}

pub fn decode_single_send(json: &str) -> Result<YunpianSendResult, TransportError> {
    let parsed: SendJsonResponse = serde_json::from_str(json)?;
    send_result(parsed)
}

/// Decode a `batch_send` / `multi_send` reply.
///
/// A request-level error (`{"code":-1,"msg":...}` without `data`) decodes to a single rejected
/// entry so callers see one shape.
pub fn decode_batch_send(json: &str) -> Result<YunpianBatchResponse, TransportError> {
    let parsed: BatchJsonResponse = serde_json::from_str(json)?;

    let mut results = parsed
        .data
        .into_iter()
        .map(send_result)
        .collect::<Result<Vec<_>, _>>()?;

    if results.is_empty() {
        if let Some(code) = parsed.code.filter(|code| *code != 0) {
            results.push(YunpianSendResult {
                code: YunpianCode::new(code),
                msg: parsed.msg,
                count: 0,
                fee_minor: 0,
                message_id: None,
                mobile: None,
            });
        }
    }

    Ok(YunpianBatchResponse {
        total_count: parsed.total_count,
        total_fee_minor: fee_minor(parsed.total_fee.as_ref())?,
        unit: parsed.unit,
        results,
    })
}

/// Split a status push into entries. Accepts a raw JSON body or a form body whose
/// `sms_status` field holds URL-encoded JSON (either the envelope or the bare array).
pub fn decode_receipts(body: &str) -> Result<Vec<ReceiptEntry>, TransportError> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        let envelope: ReceiptJsonEnvelope = serde_json::from_str(trimmed)?;
        return Ok(envelope.sms_status.into_iter().map(ReceiptEntry).collect());
    }

    let payload = url::form_urlencoded::parse(trimmed.as_bytes())
        .find(|(key, _)| key == RECEIPT_FORM_FIELD)
        .map(|(_, value)| value.into_owned())
        .ok_or(TransportError::MissingReceiptPayload)?;

    let entries = match serde_json::from_str::<serde_json::Value>(&payload)? {
        serde_json::Value::Array(entries) => entries,
        envelope @ serde_json::Value::Object(_) => {
            serde_json::from_value::<ReceiptJsonEnvelope>(envelope)?.sms_status
        }
        _ => return Err(TransportError::MissingReceiptPayload),
    };
    Ok(entries.into_iter().map(ReceiptEntry).collect())
}

use crate::domain::{
    Account, CarrierMessageId, ChuanglanBalance, ChuanglanCode, ChuanglanReply, DeliveryReceipt,
    MessageText, Mobile, Password, ReceiptStatus,
};

/// Status used when the reply carries no parseable status code.
pub const UNPARSEABLE_STATUS: i32 = -1;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("balance reply has no remaining count: {body:?}")]
    MissingRemaining { body: String },

    #[error("callback is missing `{field}`")]
    MissingCallbackField { field: &'static str },
}

pub fn encode_send_query(
    account: &Account,
    password: &Password,
    recipients: &[Mobile],
    text: &MessageText,
) -> Vec<(String, String)> {
    vec![
        (Account::FIELD.to_owned(), account.as_str().to_owned()),
        (Password::FIELD.to_owned(), password.as_str().to_owned()),
        (Mobile::FIELD.to_owned(), Mobile::join(recipients)),
        (MessageText::FIELD.to_owned(), text.as_str().to_owned()),
        ("needstatus".to_owned(), "true".to_owned()),
    ]
}

pub fn encode_balance_query(account: &Account, password: &Password) -> Vec<(String, String)> {
    vec![
        (Account::FIELD.to_owned(), account.as_str().to_owned()),
        (Password::FIELD.to_owned(), password.as_str().to_owned()),
    ]
}

/// Split a two-line reply into `(timestamp, status, second line)`.
///
/// Line 1 is `timestamp,status`; line 2 is only present on success.
fn split_reply(body: &str) -> (String, ChuanglanCode, Option<&str>) {
    let mut lines = body.split('\n').map(|line| line.trim_end_matches('\r'));
    let first = lines.next().unwrap_or_default();
    let second = lines.next().map(str::trim).filter(|line| !line.is_empty());

    let mut fields = first.splitn(2, ',');
    let timestamp = fields.next().unwrap_or_default().trim().to_owned();
    let status = fields
        .next()
        .and_then(|code| code.trim().parse::<i32>().ok())
        .unwrap_or(UNPARSEABLE_STATUS);

    (timestamp, ChuanglanCode::new(status), second)
}

/// Decode a submission reply. Total: malformed bodies decode to a failure status.
pub fn decode_send_reply(body: &str) -> ChuanglanReply {
    let (timestamp, status_code, second) = split_reply(body);
    ChuanglanReply {
        timestamp,
        status_code,
        message_id: second.unwrap_or_default().to_owned(),
    }
}

/// Decode a balance reply; line 2 is `<product>,<remaining>`.
pub fn decode_balance_reply(body: &str) -> Result<ChuanglanBalance, TransportError> {
    let (timestamp, status_code, second) = split_reply(body);
    if !status_code.is_ok() {
        return Ok(ChuanglanBalance {
            timestamp,
            status_code,
            remaining: None,
        });
    }

    let remaining = second
        .and_then(|line| line.split(',').nth(1))
        .and_then(|count| count.trim().parse::<i64>().ok())
        .ok_or_else(|| TransportError::MissingRemaining {
            body: body.to_owned(),
        })?;

    Ok(ChuanglanBalance {
        timestamp,
        status_code,
        remaining: Some(remaining),
    })
}

/// Decode a status push delivered as a query string
/// (`msgid`, `reportTime`, `mobile`, `status`).
pub fn decode_callback_query(query: &str) -> Result<DeliveryReceipt, TransportError> {
    let mut message_id = None;
    let mut report_time = String::new();
    let mut mobile = None;
    let mut status = String::new();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "msgid" => message_id = CarrierMessageId::non_empty(&value),
            "reportTime" => report_time = value.trim().to_owned(),
            "mobile" => mobile = Mobile::new(value.into_owned()).ok(),
            "status" => status = value.into_owned(),
            _ => {}
        }
    }

    let message_id =
        message_id.ok_or(TransportError::MissingCallbackField { field: "msgid" })?;
    let mobile = mobile.ok_or(TransportError::MissingCallbackField {
        field: Mobile::FIELD,
    })?;

    Ok(DeliveryReceipt {
        message_id,
        mobile,
        status: ReceiptStatus::from_chuanglan(&status),
        // reportTime is `yyMMddHHmm`.
        receipt_at: format!("20{report_time}"),
    })
}

use crate::domain::code::{ChuanglanCode, YunpianCode};
use crate::domain::value::{CarrierMessageId, Mobile};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decoded Chuanglan submission reply.
pub struct ChuanglanReply {
    pub timestamp: String,
    pub status_code: ChuanglanCode,
    /// Empty unless the submission was accepted.
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decoded Chuanglan balance reply.
pub struct ChuanglanBalance {
    pub timestamp: String,
    pub status_code: ChuanglanCode,
    pub remaining: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of one Yunpian send, either a single send or one entry of a batch.
pub struct YunpianSendResult {
    pub code: YunpianCode,
    pub msg: Option<String>,
    /// Carrier billing count (segments charged).
    pub count: u32,
    /// Fee in minor currency units (fen).
    pub fee_minor: i64,
    pub message_id: Option<CarrierMessageId>,
    pub mobile: Option<Mobile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decoded Yunpian batch reply (`batch_send.json` / `multi_send.json`).
pub struct YunpianBatchResponse {
    pub total_count: u32,
    pub total_fee_minor: i64,
    pub unit: Option<String>,
    pub results: Vec<YunpianSendResult>,
}

impl YunpianBatchResponse {
    /// First entry the carrier rejected, in response order.
    pub fn first_rejection(&self) -> Option<&YunpianSendResult> {
        self.results.iter().find(|it| !it.code.is_ok())
    }

    pub fn accepted(&self) -> impl Iterator<Item = &YunpianSendResult> {
        self.results.iter().filter(|it| it.code.is_ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Remaining send count of a carrier account.
pub struct BalanceReport {
    pub remaining_count: i64,
    pub status_code: i32,
}

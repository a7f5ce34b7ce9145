//! Carrier status-code tables.
//!
//! Each carrier has its own code space and the spaces overlap with different meanings, so
//! the tables are kept separate. Unknown codes are preserved as-is and resolve to `None`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Coarse classification of a carrier rejection.
pub enum Severity {
    /// Credentials, permissions or allowlisting.
    Auth,
    /// Busy, throttled or time-window conditions that may clear on their own.
    Transient,
    /// Content or template rejected.
    Content,
    /// Recipient number rejected or blacklisted.
    Recipient,
    /// Balance or billing exhausted.
    Balance,
    /// Malformed request or parameter.
    Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Chuanglan (Carrier A) submission status code. `0` means accepted.
pub struct ChuanglanCode(i32);

impl ChuanglanCode {
    pub const OK: Self = Self(0);

    pub fn new(code: i32) -> Self {
        Self(code)
    }

    pub fn as_i32(self) -> i32 {
        self.0
    }

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub fn known(self) -> Option<KnownChuanglanCode> {
        KnownChuanglanCode::from_code(self.0)
    }

    /// Human-readable cause, if the code is in the table.
    pub fn message(self) -> Option<&'static str> {
        self.known().map(KnownChuanglanCode::message)
    }

    pub fn is_auth_error(self) -> bool {
        matches!(self.known(), Some(kind) if kind.severity() == Severity::Auth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KnownChuanglanCode {
    NoSuchUser,
    WrongPassword,
    SubmitTooFast,
    SystemBusy,
    SensitiveContent,
    InvalidMessageLength,
    InvalidMobile,
    InvalidMobileCount,
    NoSendQuota,
    OutsideSendWindow,
    InvalidExtno,
    InvalidSignature,
    IpNotAllowlisted,
    SendNotPermitted,
    AccountExpired,
    DailyLimitReached,
    NeedStatusRequired,
    DuplicateContent,
    InvalidSendType,
    WhitelistTemplateMismatch,
    RejectionTemplateMatched,
    ApprovedTemplateMismatch,
}

impl KnownChuanglanCode {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            101 => Self::NoSuchUser,
            102 => Self::WrongPassword,
            103 => Self::SubmitTooFast,
            104 => Self::SystemBusy,
            105 => Self::SensitiveContent,
            106 => Self::InvalidMessageLength,
            107 => Self::InvalidMobile,
            108 => Self::InvalidMobileCount,
            109 => Self::NoSendQuota,
            110 => Self::OutsideSendWindow,
            113 => Self::InvalidExtno,
            116 => Self::InvalidSignature,
            117 => Self::IpNotAllowlisted,
            118 => Self::SendNotPermitted,
            119 => Self::AccountExpired,
            120 => Self::DailyLimitReached,
            121 => Self::NeedStatusRequired,
            122 => Self::DuplicateContent,
            123 => Self::InvalidSendType,
            124 => Self::WhitelistTemplateMismatch,
            125 => Self::RejectionTemplateMatched,
            126 => Self::ApprovedTemplateMismatch,
            _ => return None,
        })
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::NoSuchUser => "unknown account",
            Self::WrongPassword => "wrong password",
            Self::SubmitTooFast => "submission rate limit exceeded",
            Self::SystemBusy => "system busy",
            Self::SensitiveContent => "content contains sensitive words",
            Self::InvalidMessageLength => "message length out of range (1..=536)",
            Self::InvalidMobile => "invalid mobile number",
            Self::InvalidMobileCount => "mobile count out of range (1..=50000)",
            Self::NoSendQuota => "insufficient balance",
            Self::OutsideSendWindow => "outside allowed sending hours",
            Self::InvalidExtno => "extno is not numeric or has the wrong length",
            Self::InvalidSignature => "signature missing or invalid",
            Self::IpNotAllowlisted => "caller IP is not allowlisted",
            Self::SendNotPermitted => "account is not permitted to send",
            Self::AccountExpired => "sender expired",
            Self::DailyLimitReached => "daily anti-abuse limit reached",
            Self::NeedStatusRequired => "needstatus must be true or false",
            Self::DuplicateContent => "too many identical messages within 5 minutes",
            Self::InvalidSendType => "invalid send type",
            Self::WhitelistTemplateMismatch => "whitelist template mismatch",
            Self::RejectionTemplateMatched => "content matched a rejection template",
            Self::ApprovedTemplateMismatch => "approved template mismatch",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::NoSuchUser
            | Self::WrongPassword
            | Self::IpNotAllowlisted
            | Self::SendNotPermitted
            | Self::AccountExpired => Severity::Auth,
            Self::SubmitTooFast
            | Self::SystemBusy
            | Self::OutsideSendWindow
            | Self::DailyLimitReached
            | Self::DuplicateContent => Severity::Transient,
            Self::SensitiveContent
            | Self::InvalidMessageLength
            | Self::InvalidSignature
            | Self::WhitelistTemplateMismatch
            | Self::RejectionTemplateMatched
            | Self::ApprovedTemplateMismatch => Severity::Content,
            Self::InvalidMobile | Self::InvalidMobileCount => Severity::Recipient,
            Self::NoSendQuota => Severity::Balance,
            Self::InvalidExtno | Self::NeedStatusRequired | Self::InvalidSendType => {
                Severity::Request
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Yunpian (Carrier B) response code. `0` means success; negative codes are account or
/// platform level failures.
pub struct YunpianCode(i32);

impl YunpianCode {
    pub const OK: Self = Self(0);

    pub fn new(code: i32) -> Self {
        Self(code)
    }

    pub fn as_i32(self) -> i32 {
        self.0
    }

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub fn known(self) -> Option<KnownYunpianCode> {
        KnownYunpianCode::from_code(self.0)
    }

    pub fn message(self) -> Option<&'static str> {
        self.known().map(KnownYunpianCode::message)
    }

    pub fn is_auth_error(self) -> bool {
        matches!(self.known(), Some(kind) if kind.severity() == Severity::Auth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KnownYunpianCode {
    InvalidApiKey,
    ApiNotPermitted,
    IpNotPermitted,
    CallCountExceeded,
    CallRateExceeded,
    UnknownException,
    SystemBusy,
    RechargeFailed,
    SubmitFailed,
    RecordExists,
    RecordNotFound,
    FixedSignatureMissing,
    MissingParameter,
    MalformedParameter,
    InsufficientBalance,
    KeywordBlocked,
    TemplateNotFound,
    TemplateAddFailed,
    TemplateUnavailable,
    DuplicateWithin30Seconds,
    DuplicateWithin5Minutes,
    RecipientBlacklisted,
    GetNotSupported,
    PostNotSupported,
    MarketingSuspended,
    DecodeFailed,
    SignatureMismatch,
    SignatureMalformed,
    DailyRecipientLimit,
    SignatureCheckFailed,
    RequestExpired,
    UnsupportedRegion,
    DecryptFailed,
    HourlyRecipientLimit,
    RegionNotInTemplate,
    AlarmSettingFailed,
    MobileContentCountMismatch,
    TrafficPackageError,
    AmountBillingDisabled,
    OperatorError,
    FrequencyExceeded,
}

impl KnownYunpianCode {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            -1 => Self::InvalidApiKey,
            -2 => Self::ApiNotPermitted,
            -3 => Self::IpNotPermitted,
            -4 => Self::CallCountExceeded,
            -5 => Self::CallRateExceeded,
            -50 => Self::UnknownException,
            -51 => Self::SystemBusy,
            -52 => Self::RechargeFailed,
            -53 => Self::SubmitFailed,
            -54 => Self::RecordExists,
            -55 => Self::RecordNotFound,
            -57 => Self::FixedSignatureMissing,
            1 => Self::MissingParameter,
            2 => Self::MalformedParameter,
            3 => Self::InsufficientBalance,
            4 => Self::KeywordBlocked,
            5 => Self::TemplateNotFound,
            6 => Self::TemplateAddFailed,
            7 => Self::TemplateUnavailable,
            8 => Self::DuplicateWithin30Seconds,
            9 => Self::DuplicateWithin5Minutes,
            10 => Self::RecipientBlacklisted,
            11 => Self::GetNotSupported,
            12 => Self::PostNotSupported,
            13 => Self::MarketingSuspended,
            14 => Self::DecodeFailed,
            15 => Self::SignatureMismatch,
            16 => Self::SignatureMalformed,
            17 => Self::DailyRecipientLimit,
            18 => Self::SignatureCheckFailed,
            19 => Self::RequestExpired,
            20 => Self::UnsupportedRegion,
            21 => Self::DecryptFailed,
            22 => Self::HourlyRecipientLimit,
            23 => Self::RegionNotInTemplate,
            24 => Self::AlarmSettingFailed,
            25 => Self::MobileContentCountMismatch,
            26 => Self::TrafficPackageError,
            27 => Self::AmountBillingDisabled,
            28 => Self::OperatorError,
            33 => Self::FrequencyExceeded,
            _ => return None,
        })
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidApiKey => "invalid apikey",
            Self::ApiNotPermitted => "API not permitted for this key",
            Self::IpNotPermitted => "caller IP not permitted",
            Self::CallCountExceeded => "call count limit exceeded",
            Self::CallRateExceeded => "call rate limit exceeded",
            Self::UnknownException => "unknown carrier exception",
            Self::SystemBusy => "system busy",
            Self::RechargeFailed => "recharge failed",
            Self::SubmitFailed => "submitting the message failed",
            Self::RecordExists => "record already exists",
            Self::RecordNotFound => "record does not exist",
            Self::FixedSignatureMissing => "fixed signature enabled but not configured",
            Self::MissingParameter => "required parameter missing",
            Self::MalformedParameter => "parameter has the wrong format",
            Self::InsufficientBalance => "insufficient balance",
            Self::KeywordBlocked => "content contains a blocked keyword",
            Self::TemplateNotFound => "no template with this id",
            Self::TemplateAddFailed => "adding the template failed",
            Self::TemplateUnavailable => "template unavailable",
            Self::DuplicateWithin30Seconds => {
                "same content to the same mobile within 30 seconds"
            }
            Self::DuplicateWithin5Minutes => {
                "same content to the same mobile more than 3 times within 5 minutes"
            }
            Self::RecipientBlacklisted => "recipient is blacklisted",
            Self::GetNotSupported => "GET is not supported by this endpoint",
            Self::PostNotSupported => "POST is not supported by this endpoint",
            Self::MarketingSuspended => "marketing messages are suspended",
            Self::DecodeFailed => "decoding the request failed",
            Self::SignatureMismatch => "signature does not match",
            Self::SignatureMalformed => "signature format is invalid",
            Self::DailyRecipientLimit => "daily send limit for this mobile reached",
            Self::SignatureCheckFailed => "request signature verification failed",
            Self::RequestExpired => "request expired",
            Self::UnsupportedRegion => "unsupported country or region",
            Self::DecryptFailed => "decrypting the request failed",
            Self::HourlyRecipientLimit => "hourly send limit for this mobile reached",
            Self::RegionNotInTemplate => "region is outside the template's country list",
            Self::AlarmSettingFailed => "adding the alarm setting failed",
            Self::MobileContentCountMismatch => "mobile and content counts do not match",
            Self::TrafficPackageError => "traffic package error",
            Self::AmountBillingDisabled => "amount billing is not enabled",
            Self::OperatorError => "operator error",
            Self::FrequencyExceeded => "frequency limit exceeded",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::InvalidApiKey
            | Self::ApiNotPermitted
            | Self::IpNotPermitted
            | Self::SignatureCheckFailed => Severity::Auth,
            Self::CallCountExceeded
            | Self::CallRateExceeded
            | Self::UnknownException
            | Self::SystemBusy
            | Self::SubmitFailed
            | Self::DuplicateWithin30Seconds
            | Self::DuplicateWithin5Minutes
            | Self::MarketingSuspended
            | Self::DailyRecipientLimit
            | Self::HourlyRecipientLimit
            | Self::OperatorError
            | Self::FrequencyExceeded => Severity::Transient,
            Self::FixedSignatureMissing
            | Self::KeywordBlocked
            | Self::TemplateNotFound
            | Self::TemplateUnavailable
            | Self::SignatureMismatch
            | Self::SignatureMalformed => Severity::Content,
            Self::RecipientBlacklisted | Self::UnsupportedRegion | Self::RegionNotInTemplate => {
                Severity::Recipient
            }
            Self::RechargeFailed
            | Self::InsufficientBalance
            | Self::TrafficPackageError
            | Self::AmountBillingDisabled => Severity::Balance,
            Self::RecordExists
            | Self::RecordNotFound
            | Self::MissingParameter
            | Self::MalformedParameter
            | Self::TemplateAddFailed
            | Self::GetNotSupported
            | Self::PostNotSupported
            | Self::DecodeFailed
            | Self::RequestExpired
            | Self::DecryptFailed
            | Self::AlarmSettingFailed
            | Self::MobileContentCountMismatch => Severity::Request,
        }
    }
}

use crate::domain::validation::ValidationError;

use phonenumber::country;

fn non_empty_trimmed(value: String, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Carrier account name (`account`).
///
/// Invariant: non-empty after trimming.
pub struct Account(String);

impl Account {
    /// Query field name used by Carrier A (`account`).
    pub const FIELD: &'static str = "account";

    /// Create a validated [`Account`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self(non_empty_trimmed(value.into(), Self::FIELD)?))
    }

    /// Borrow the validated account name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Carrier account password (`pswd`).
///
/// Invariant: must not be empty (whitespace is preserved and allowed).
pub struct Password(String);

impl Password {
    /// Query field name used by Carrier A (`pswd`).
    pub const FIELD: &'static str = "pswd";

    /// Create a validated [`Password`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the password as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Carrier B API key (`apikey`).
///
/// Invariant: non-empty after trimming.
pub struct ApiKey(String);

impl ApiKey {
    /// JSON field name used by Carrier B (`apikey`).
    pub const FIELD: &'static str = "apikey";

    /// Create a validated [`ApiKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self(non_empty_trimmed(value.into(), Self::FIELD)?))
    }

    /// Borrow the validated key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Rendered SMS text (`msg`).
///
/// Invariant: non-empty after trimming. The original value (including whitespace) is preserved.
pub struct MessageText(String);

impl MessageText {
    /// Query field name used by Carrier A (`msg`).
    pub const FIELD: &'static str = "msg";

    /// Create validated message text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Recipient mobile number as sent to the carrier (`mobile`).
///
/// Invariant: non-empty after trimming. No normalization is performed; parse into
/// [`PhoneNumber`] first when normalization is wanted.
pub struct Mobile(String);

impl Mobile {
    /// Field name used by both carriers (`mobile`).
    pub const FIELD: &'static str = "mobile";

    /// Create a validated (non-empty) mobile.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self(non_empty_trimmed(value.into(), Self::FIELD)?))
    }

    /// Validate a list of raw mobiles, rejecting an empty list.
    pub fn list<I, S>(values: I) -> Result<Vec<Self>, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mobiles = values
            .into_iter()
            .map(Self::new)
            .collect::<Result<Vec<_>, _>>()?;
        if mobiles.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(mobiles)
    }

    /// Raw (trimmed) value as sent to the carrier.
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Comma-joined wire form of a recipient list.
    pub fn join(mobiles: &[Mobile]) -> String {
        mobiles
            .iter()
            .map(Mobile::raw)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl From<PhoneNumber> for Mobile {
    /// Carriers expect the national significant number without a country prefix.
    fn from(value: PhoneNumber) -> Self {
        Self(value.national)
    }
}

#[derive(Debug, Clone)]
/// Parsed phone number.
///
/// Equality and hashing are based on the E.164 form.
pub struct PhoneNumber {
    raw: String,
    e164: String,
    national: String,
}

impl PhoneNumber {
    pub const FIELD: &'static str = "mobile";

    /// Parse and normalize a phone number.
    ///
    /// `default_region` is used when the input does not contain an explicit country prefix.
    pub fn parse(
        default_region: Option<country::Id>,
        input: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let input = input.into();
        let raw = input.trim().to_owned();
        if raw.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let parsed = phonenumber::parse(default_region, &raw)
            .map_err(|_| ValidationError::InvalidPhoneNumber { input: raw.clone() })?;
        if !phonenumber::is_valid(&parsed) {
            return Err(ValidationError::InvalidPhoneNumber { input: raw });
        }

        let e164 = phonenumber::format(&parsed)
            .mode(phonenumber::Mode::E164)
            .to_string();
        let national = parsed.national().value().to_string();

        Ok(Self {
            raw,
            e164,
            national,
        })
    }

    /// Parse with mainland China as the default region.
    pub fn parse_cn(input: impl Into<String>) -> Result<Self, ValidationError> {
        Self::parse(Some(country::Id::CN), input)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn e164(&self) -> &str {
        &self.e164
    }

    pub fn national(&self) -> &str {
        &self.national
    }
}

impl PartialEq for PhoneNumber {
    fn eq(&self, other: &Self) -> bool {
        self.e164 == other.e164
    }
}

impl Eq for PhoneNumber {}

impl std::hash::Hash for PhoneNumber {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.e164.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Carrier-assigned message id (`msgid` / `sid`).
///
/// Invariant: non-empty after trimming.
pub struct CarrierMessageId(String);

impl CarrierMessageId {
    pub const FIELD: &'static str = "msgid";

    /// Create a validated [`CarrierMessageId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self(non_empty_trimmed(value.into(), Self::FIELD)?))
    }

    /// `None` for blank input, which carriers use to mean "no id issued".
    pub fn non_empty(value: &str) -> Option<Self> {
        Self::new(value).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Single-message character limit of a carrier, counted in code points.
///
/// Invariant: `> 0`.
pub struct MaxLength(u32);

impl MaxLength {
    pub const FIELD: &'static str = "single_sms_max_length";

    /// Create a validated [`MaxLength`].
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        match u32::try_from(value) {
            Ok(v) if v > 0 => Ok(Self(v)),
            _ => Err(ValidationError::NonPositive {
                field: Self::FIELD,
                actual: value,
            }),
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Tenant id used by the quota ledger and send records.
pub struct CompanyId(i64);

impl CompanyId {
    /// System-internal sender (verification traffic).
    pub const SYSTEM: Self = Self(-1);
    /// Platform-level ledger row.
    pub const PLATFORM: Self = Self(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// A real tenant, as opposed to [`CompanyId::SYSTEM`] or [`CompanyId::PLATFORM`].
    pub fn tenant(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::NonPositive {
                field: "company_id",
                actual: value,
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Template id; [`TemplateId::FREEFORM`] marks content sent without a template.
pub struct TemplateId(i64);

impl TemplateId {
    pub const FREEFORM: Self = Self(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_freeform(self) -> bool {
        self.0 <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Integrated SMS carriers.
pub enum Carrier {
    /// Chuanglan 253, two-line text protocol (Carrier A).
    Chuanglan,
    /// Yunpian, JSON protocol (Carrier B).
    Yunpian,
}

impl Carrier {
    /// `type` column of the service-provider table.
    pub fn provider_type(self) -> i16 {
        match self {
            Self::Chuanglan => 10,
            Self::Yunpian => 20,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Chuanglan => "chuanglan",
            Self::Yunpian => "yunpian",
        }
    }
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Carrier {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chuanglan" | "253" => Ok(Self::Chuanglan),
            "yunpian" => Ok(Self::Yunpian),
            "" => Err(ValidationError::Empty { field: "carrier" }),
            _ => Err(ValidationError::UnknownCarrier {
                value: value.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_newtypes_trim_or_validate() {
        let account = Account::new("  N123 ").unwrap();
        assert_eq!(account.as_str(), "N123");
        assert!(Account::new("  ").is_err());

        let password = Password::new(" secret ").unwrap();
        assert_eq!(password.as_str(), " secret ");
        assert!(Password::new("").is_err());

        let key = ApiKey::new(" k ").unwrap();
        assert_eq!(key.as_str(), "k");

        let msg = MessageText::new(" hi ").unwrap();
        assert_eq!(msg.as_str(), " hi ");
        assert!(MessageText::new(" \n ").is_err());

        assert!(CarrierMessageId::non_empty("").is_none());
        assert_eq!(
            CarrierMessageId::non_empty(" 161025 ").unwrap().as_str(),
            "161025"
        );
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let password = Password::new("hunter2").unwrap();
        assert_eq!(format!("{password:?}"), "Password(***)");
        let key = ApiKey::new("abc").unwrap();
        assert!(!format!("{key:?}").contains("abc"));
    }

    #[test]
    fn mobile_list_rejects_empty_and_joins_with_commas() {
        assert!(matches!(
            Mobile::list(Vec::<String>::new()),
            Err(ValidationError::Empty { field: "mobile" })
        ));
        assert!(Mobile::list(["15205201314", " "]).is_err());

        let mobiles = Mobile::list([" 15205201314", "13800138000 "]).unwrap();
        assert_eq!(Mobile::join(&mobiles), "15205201314,13800138000");
    }

    #[test]
    fn phone_number_parses_cn_and_converts_to_national_mobile() {
        let p1 = PhoneNumber::parse_cn("15205201314").unwrap();
        let p2 = PhoneNumber::parse(None, "+86 152 0520 1314").unwrap();
        assert_eq!(p1, p2);
        assert_eq!(p1.e164(), "+8615205201314");
        assert_eq!(p1.national(), "15205201314");

        let mobile: Mobile = p1.into();
        assert_eq!(mobile.raw(), "15205201314");
        assert!(PhoneNumber::parse_cn("not-a-number").is_err());
        assert!(PhoneNumber::parse_cn("  ").is_err());
    }

    #[test]
    fn max_length_must_be_positive() {
        assert_eq!(MaxLength::new(70).unwrap().value(), 70);
        assert!(matches!(
            MaxLength::new(0),
            Err(ValidationError::NonPositive { actual: 0, .. })
        ));
        assert!(MaxLength::new(-5).is_err());
    }

    #[test]
    fn company_and_template_ids() {
        assert_eq!(CompanyId::SYSTEM.value(), -1);
        assert!(CompanyId::tenant(0).is_err());
        assert_eq!(CompanyId::tenant(7).unwrap().value(), 7);
        assert!(TemplateId::FREEFORM.is_freeform());
        assert!(!TemplateId::new(3).is_freeform());
    }

    #[test]
    fn carrier_parses_from_config_names() {
        assert_eq!("Chuanglan".parse::<Carrier>().unwrap(), Carrier::Chuanglan);
        assert_eq!(" yunpian ".parse::<Carrier>().unwrap(), Carrier::Yunpian);
        assert!(matches!(
            "twilio".parse::<Carrier>(),
            Err(ValidationError::UnknownCarrier { .. })
        ));
        assert_eq!(Carrier::Chuanglan.provider_type(), 10);
        assert_eq!(Carrier::Yunpian.provider_type(), 20);
    }
}

use crate::domain::validation::ValidationError;
use crate::domain::value::{MessageText, Mobile};

/// Recipient limit of one Yunpian batch request.
pub const BATCH_SEND_MAX_RECIPIENTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Traffic class of an outbound message. Each class uses its own carrier credentials.
pub enum TrafficClass {
    /// Verification codes; cannot be unsubscribed from.
    Verification,
    /// Marketing messages; recipients may unsubscribe.
    Marketing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Carrier account whose balance is queried (`account_type`).
pub enum AccountClass {
    Verification,
    Marketing,
}

impl AccountClass {
    pub const FIELD: &'static str = "account_type";

    pub fn from_code(value: i64) -> Result<Self, ValidationError> {
        match value {
            1 => Ok(Self::Verification),
            2 => Ok(Self::Marketing),
            _ => Err(ValidationError::UnknownAccountClass { value }),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Verification => 1,
            Self::Marketing => 2,
        }
    }
}

impl From<TrafficClass> for AccountClass {
    fn from(value: TrafficClass) -> Self {
        match value {
            TrafficClass::Verification => Self::Verification,
            TrafficClass::Marketing => Self::Marketing,
        }
    }
}

#[derive(Debug, Clone)]
/// Rendered message ready for a carrier.
pub struct OutboundMessage {
    text: MessageText,
    recipients: Vec<Mobile>,
    class: TrafficClass,
}

impl OutboundMessage {
    pub fn new(
        text: MessageText,
        recipients: Vec<Mobile>,
        class: TrafficClass,
    ) -> Result<Self, ValidationError> {
        if recipients.is_empty() {
            return Err(ValidationError::Empty {
                field: Mobile::FIELD,
            });
        }
        Ok(Self {
            text,
            recipients,
            class,
        })
    }

    pub fn verification(
        text: MessageText,
        recipients: Vec<Mobile>,
    ) -> Result<Self, ValidationError> {
        Self::new(text, recipients, TrafficClass::Verification)
    }

    pub fn marketing(
        text: MessageText,
        recipients: Vec<Mobile>,
    ) -> Result<Self, ValidationError> {
        Self::new(text, recipients, TrafficClass::Marketing)
    }

    pub fn text(&self) -> &MessageText {
        &self.text
    }

    pub fn recipients(&self) -> &[Mobile] {
        &self.recipients
    }

    pub fn class(&self) -> TrafficClass {
        self.class
    }
}

#[derive(Debug, Clone)]
/// Yunpian batch request: one text to many recipients, or one text per recipient.
pub enum BatchSend {
    SameContent(SameContent),
    PerRecipient(PerRecipient),
}

#[derive(Debug, Clone)]
pub struct SameContent {
    recipients: Vec<Mobile>,
    text: MessageText,
}

#[derive(Debug, Clone)]
pub struct PerRecipient {
    messages: Vec<(Mobile, MessageText)>,
}

fn check_recipient_count(count: usize) -> Result<(), ValidationError> {
    if count == 0 {
        return Err(ValidationError::Empty {
            field: Mobile::FIELD,
        });
    }
    if count > BATCH_SEND_MAX_RECIPIENTS {
        return Err(ValidationError::TooManyRecipients {
            max: BATCH_SEND_MAX_RECIPIENTS,
            actual: count,
        });
    }
    Ok(())
}

impl BatchSend {
    pub fn same_content(
        recipients: Vec<Mobile>,
        text: MessageText,
    ) -> Result<Self, ValidationError> {
        check_recipient_count(recipients.len())?;
        Ok(Self::SameContent(SameContent { recipients, text }))
    }

    /// Pair `contents[i]` with `mobiles[i]`; both lists must have the same length.
    pub fn per_recipient(
        contents: Vec<MessageText>,
        mobiles: Vec<Mobile>,
    ) -> Result<Self, ValidationError> {
        if contents.len() != mobiles.len() {
            return Err(ValidationError::LengthMismatch {
                contents: contents.len(),
                mobiles: mobiles.len(),
            });
        }
        check_recipient_count(mobiles.len())?;
        Ok(Self::PerRecipient(PerRecipient {
            messages: mobiles.into_iter().zip(contents).collect(),
        }))
    }

    pub fn recipient_count(&self) -> usize {
        match self {
            Self::SameContent(same) => same.recipients.len(),
            Self::PerRecipient(per) => per.messages.len(),
        }
    }
}

impl SameContent {
    pub fn recipients(&self) -> &[Mobile] {
        &self.recipients
    }

    pub fn text(&self) -> &MessageText {
        &self.text
    }
}

impl PerRecipient {
    pub fn messages(&self) -> &[(Mobile, MessageText)] {
        &self.messages
    }
}

//! Send orchestration: template rendering, quota gating, the carrier call, ledger debit and
//! the send record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::carrier::{Provider, SendAttemptResult};
use crate::client::GatewayError;
use crate::domain::{
    CompanyId, MessageText, Mobile, OutboundMessage, PhoneNumber, TemplateId, TrafficClass,
    ValidationError, marketing_freeform, render_template,
};
use crate::ledger::QuotaLedger;
use crate::store::{SendRecord, SendRecordStore, TemplateStore};
use crate::verification::VerificationCodes;

/// Template name of the verification-code message.
pub const VERIFICATION_TEMPLATE_NAME: &str = "MOBILE_VERIFICATION_CODE_CONTENT";

#[derive(Debug, Clone)]
pub struct MarketingRequest {
    pub company: CompanyId,
    /// [`TemplateId::FREEFORM`] sends `content` as is (wrapped with signature and opt-out).
    pub template: TemplateId,
    pub content: String,
    pub mobiles: Vec<Mobile>,
    /// Arguments after the signature for templated sends.
    pub args: Vec<String>,
}

#[derive(Debug)]
/// A carrier-accepted send that was debited and recorded.
pub struct SendOutcome {
    pub record_id: i64,
    pub content: String,
    pub attempt: SendAttemptResult,
}

pub struct SendOrchestrator {
    provider: Arc<dyn Provider>,
    ledger: QuotaLedger,
    templates: Arc<dyn TemplateStore>,
    sends: Arc<dyn SendRecordStore>,
    codes: Arc<VerificationCodes>,
}

impl SendOrchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        ledger: QuotaLedger,
        templates: Arc<dyn TemplateStore>,
        sends: Arc<dyn SendRecordStore>,
        codes: Arc<VerificationCodes>,
    ) -> Self {
        Self {
            provider,
            ledger,
            templates,
            sends,
            codes,
        }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Render the verification template with `code` and send it.
    #[instrument(skip_all, fields(carrier = %self.provider.carrier(), recipients = mobiles.len()))]
    pub async fn send_verification(
        &self,
        code: &str,
        mobiles: Vec<Mobile>,
    ) -> Result<SendOutcome, GatewayError> {
        if mobiles.is_empty() {
            return Err(ValidationError::Empty {
                field: Mobile::FIELD,
            }
            .into());
        }

        let profile = self.provider.profile().await?;
        let template = self
            .templates
            .template_by_name(profile.provider_id, VERIFICATION_TEMPLATE_NAME)?
            .ok_or(GatewayError::MissingTemplate {
                name: VERIFICATION_TEMPLATE_NAME,
            })?;
        let content = render_template(
            &template.template_content,
            &[profile.sign_name.clone(), code.to_owned()],
        )?;
        let message = OutboundMessage::verification(MessageText::new(content)?, mobiles)?;

        let attempt = self
            .provider
            .send_verification(message.text(), message.recipients())
            .await?;
        self.settle(CompanyId::SYSTEM, template.id(), message, attempt)
            .await
    }

    /// Gate on quota, render, and send a marketing message for a tenant company.
    #[instrument(
        skip_all,
        fields(
            carrier = %self.provider.carrier(),
            company = request.company.value(),
            template = request.template.value(),
            recipients = request.mobiles.len(),
        )
    )]
    pub async fn send_marketing(
        &self,
        request: MarketingRequest,
    ) -> Result<SendOutcome, GatewayError> {
        let company = CompanyId::tenant(request.company.value())?;
        if request.mobiles.is_empty() {
            return Err(ValidationError::Empty {
                field: Mobile::FIELD,
            }
            .into());
        }
        if request.template.is_freeform() && request.content.trim().is_empty() {
            return Err(ValidationError::Empty { field: "content" }.into());
        }

        self.ledger.ensure_marketing_quota(company).await?;
        let profile = self.provider.profile().await?;

        let content = if request.template.is_freeform() {
            marketing_freeform(&profile.sign_name, &request.content)
        } else {
            let template = self.templates.template(request.template)?.ok_or(
                ValidationError::UnknownTemplate {
                    id: request.template.value(),
                },
            )?;
            let mut args = Vec::with_capacity(request.args.len() + 1);
            args.push(profile.sign_name.clone());
            args.extend(request.args.iter().cloned());
            render_template(&template.template_content, &args)?
        };
        let message = OutboundMessage::marketing(MessageText::new(content)?, request.mobiles)?;

        let attempt = self
            .provider
            .send_marketing(message.text(), message.recipients())
            .await?;
        self.settle(company, request.template, message, attempt)
            .await
    }

    /// Issue a code for `mobile` and send it; the code is revoked when sending fails unless a
    /// newer one replaced it meanwhile.
    pub async fn issue_verification_code(
        &self,
        mobile: &PhoneNumber,
    ) -> Result<SendOutcome, GatewayError> {
        let code = self.codes.issue(mobile)?;
        match self
            .send_verification(&code, vec![Mobile::from(mobile.clone())])
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.codes.revoke(mobile, &code)?;
                Err(err)
            }
        }
    }

    pub fn match_verification_code(
        &self,
        mobile: &PhoneNumber,
        code: &str,
    ) -> Result<(), GatewayError> {
        Ok(self.codes.match_code(mobile, code)?)
    }

    /// Debit (on acceptance) and record an attempt, then report its outcome.
    ///
    /// The record is written for rejected attempts and failed debits too. A record failure
    /// takes precedence over a debit failure and is reported without crediting back.
    async fn settle(
        &self,
        company: CompanyId,
        template: TemplateId,
        message: OutboundMessage,
        mut attempt: SendAttemptResult,
    ) -> Result<SendOutcome, GatewayError> {
        let units = attempt.segmentation.billable_units;

        let debited = if attempt.is_accepted() {
            match message.class() {
                TrafficClass::Verification => self.ledger.debit_verification(units).await,
                TrafficClass::Marketing => self.ledger.debit_marketing(company, units).await,
            }
        } else {
            Ok(())
        };

        let content = message.text().as_str().to_owned();
        let record = SendRecord {
            template_id: template,
            company_id: company,
            content: content.clone(),
            receiver_mobiles: Mobile::join(message.recipients()),
            send_status: attempt.status_code.to_string(),
            count: units,
            count_per_content: attempt.segmentation.segments_per_recipient,
            message_id: attempt.recorded_message_id(),
            send_at: Utc::now(),
        };
        let persisted = self.sends.insert_send_record(record);

        if let Some(err) = attempt.error.take() {
            warn!(code = err.code(), error = %err, "send attempt failed");
            if let Err(store_err) = &persisted {
                error!(error = %store_err, "failed to record failed send attempt");
            }
            return Err(err);
        }

        let record_id = persisted.map_err(|err| {
            error!(error = %err, "failed to record accepted send");
            GatewayError::from(err)
        })?;
        if let Err(err) = debited {
            error!(error = %err, record_id, units, "failed to debit sms balance");
            return Err(err);
        }
        info!(
            record_id,
            units,
            message_id = %attempt.recorded_message_id(),
            "message accepted"
        );
        Ok(SendOutcome {
            record_id,
            content,
            attempt,
        })
    }
}

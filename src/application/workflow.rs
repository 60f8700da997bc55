use super::payment::PaymentInitiator;
use super::transactions::TransactionStore;
use crate::domain::payment::CheckoutLink;
use crate::domain::profile::{Profile, ProfileValidator};
use crate::domain::program::{Program, ProgramCatalog};
use crate::domain::recommendation::recommend;
use crate::domain::registration::{Registration, RegistrationDraft};
use crate::error::{EnrollmentError, Result};
use std::fmt;

/// Progress of a single enrollment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowState {
    CollectingProfile,
    ProfileValid,
    ProgramSelected,
    TransactionRecorded,
    PaymentLinkIssued,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::CollectingProfile => "collecting profile",
            WorkflowState::ProfileValid => "profile valid",
            WorkflowState::ProgramSelected => "program selected",
            WorkflowState::TransactionRecorded => "transaction recorded",
            WorkflowState::PaymentLinkIssued => "payment link issued",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the catalog and the collaborators every enrollment session uses.
///
/// The service holds no per-student state; call [`EnrollmentService::start`]
/// for each student and drive the returned session step by step.
pub struct EnrollmentService {
    catalog: ProgramCatalog,
    validator: ProfileValidator,
    transactions: TransactionStore,
    payments: PaymentInitiator,
}

impl EnrollmentService {
    pub fn new(
        catalog: ProgramCatalog,
        validator: ProfileValidator,
        transactions: TransactionStore,
        payments: PaymentInitiator,
    ) -> Self {
        Self {
            catalog,
            validator,
            transactions,
            payments,
        }
    }

    pub fn catalog(&self) -> &ProgramCatalog {
        &self.catalog
    }

    pub fn recommend(&self, interests: &str) -> Vec<&Program> {
        recommend(self.catalog.programs(), interests)
    }

    pub fn start(&self) -> EnrollmentSession<'_> {
        EnrollmentSession {
            service: self,
            state: WorkflowState::CollectingProfile,
            profile: None,
            program: None,
            registration: None,
            checkout: None,
            last_error: None,
        }
    }

    /// Stored registrations for the admin view.
    pub async fn registrations(&self) -> Result<Vec<Registration>> {
        self.transactions.list_transactions().await
    }
}

/// One student's walk through validation, selection, persistence and payment.
///
/// A failed step never moves the session backwards: it records the error in
/// [`EnrollmentSession::last_error`] and stays where it was, so the caller can
/// correct the input or simply retry.
pub struct EnrollmentSession<'a> {
    service: &'a EnrollmentService,
    state: WorkflowState,
    profile: Option<Profile>,
    program: Option<&'a Program>,
    registration: Option<Registration>,
    checkout: Option<CheckoutLink>,
    last_error: Option<String>,
}

impl<'a> EnrollmentSession<'a> {
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn selected_program(&self) -> Option<&'a Program> {
        self.program
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    pub fn checkout_link(&self) -> Option<&CheckoutLink> {
        self.checkout.as_ref()
    }

    /// Validates and keeps the profile. Allowed until a registration is recorded.
    pub fn confirm_profile(&mut self, profile: Profile) -> Result<()> {
        self.require_state(
            "confirm the profile",
            &[
                WorkflowState::CollectingProfile,
                WorkflowState::ProfileValid,
                WorkflowState::ProgramSelected,
            ],
        )?;

        if let Err(e) = self.service.validator.validate(&profile) {
            return self.fail(e.into());
        }

        self.profile = Some(profile);
        if self.state == WorkflowState::CollectingProfile {
            self.advance(WorkflowState::ProfileValid);
        } else {
            self.last_error = None;
        }
        Ok(())
    }

    /// Programs matching the confirmed profile's interests, in catalog order.
    pub fn recommendations(&mut self) -> Result<Vec<&'a Program>> {
        self.require_state(
            "list recommendations",
            &[WorkflowState::ProfileValid, WorkflowState::ProgramSelected],
        )?;
        let service = self.service;
        let interests = self
            .profile
            .as_ref()
            .and_then(|p| p.interests.as_deref())
            .unwrap_or_default();
        Ok(service.recommend(interests))
    }

    pub fn select_program(&mut self, code: &str) -> Result<&'a Program> {
        self.require_state(
            "select a program",
            &[WorkflowState::ProfileValid, WorkflowState::ProgramSelected],
        )?;

        let service = self.service;
        let program = match service.catalog.require(code) {
            Ok(program) => program,
            Err(e) => return self.fail(e),
        };
        self.program = Some(program);
        self.advance(WorkflowState::ProgramSelected);
        Ok(program)
    }

    /// Persists a `Pending` registration for the selected program.
    pub async fn record_transaction(&mut self) -> Result<&Registration> {
        self.require_state("record the registration", &[WorkflowState::ProgramSelected])?;

        let (Some(profile), Some(program)) = (self.profile.as_ref(), self.program) else {
            return self.fail(EnrollmentError::InvalidTransition {
                action: "record the registration",
                state: self.state.as_str(),
            });
        };
        let draft = RegistrationDraft::new(profile, program);

        let service = self.service;
        match service.transactions.create_transaction(draft).await {
            Ok(stored) => {
                self.advance(WorkflowState::TransactionRecorded);
                Ok(self.registration.insert(stored))
            }
            Err(e) => self.fail(e),
        }
    }

    /// Requests a payment intent for the recorded fee and renders the checkout link.
    pub async fn initiate_payment(&mut self) -> Result<&CheckoutLink> {
        self.require_state("start the payment", &[WorkflowState::TransactionRecorded])?;

        let Some(registration) = self.registration.as_ref() else {
            return self.fail(EnrollmentError::InvalidTransition {
                action: "start the payment",
                state: self.state.as_str(),
            });
        };

        let service = self.service;
        let payments = &service.payments;
        let link = payments
            .initiate(registration.amount, &registration.currency)
            .await
            .and_then(|reference| payments.checkout_link(&reference));
        match link {
            Ok(link) => {
                self.advance(WorkflowState::PaymentLinkIssued);
                Ok(self.checkout.insert(link))
            }
            Err(e) => self.fail(e),
        }
    }

    /// Drives every step in order and returns the checkout link.
    pub async fn run(&mut self, profile: Profile, program_code: &str) -> Result<CheckoutLink> {
        self.confirm_profile(profile)?;
        self.select_program(program_code)?;
        self.record_transaction().await?;
        self.initiate_payment().await.cloned()
    }

    fn require_state(&mut self, action: &'static str, allowed: &[WorkflowState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            self.fail(EnrollmentError::InvalidTransition {
                action,
                state: self.state.as_str(),
            })
        }
    }

    fn advance(&mut self, next: WorkflowState) {
        tracing::info!(from = %self.state, to = %next, "enrollment step completed");
        self.state = next;
        self.last_error = None;
    }

    fn fail<T>(&mut self, error: EnrollmentError) -> Result<T> {
        tracing::warn!(state = %self.state, error = %error, "enrollment step failed");
        self.last_error = Some(error.to_string());
        Err(error)
    }
}

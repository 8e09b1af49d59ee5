//! 应用层

mod verification_mailer;

pub use verification_mailer::{
    DispatchResult, MailerSettings, VerificationMailer, VERIFICATION_FAILED_MESSAGE,
    VERIFICATION_SENT_MESSAGE,
};

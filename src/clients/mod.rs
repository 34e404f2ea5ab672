pub mod sms_client;

pub use sms_client::SmsClient;

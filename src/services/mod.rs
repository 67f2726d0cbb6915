pub mod auth_service;
pub mod csv_service;
pub mod dispatch_service;
pub mod file_service;
pub mod mail_log_service;
pub mod scheduler;
pub mod template;
pub mod template_service;
pub mod token_service;

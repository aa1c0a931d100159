pub mod dashboard_repo;
pub mod directory_repo;
pub mod event_repo;
pub mod payment_repo;
pub mod registration_repo;
pub mod user_repo;

pub use dashboard_repo::DashboardRepository;
pub use directory_repo::DirectoryRepository;
pub use event_repo::EventRepository;
pub use payment_repo::PaymentRepository;
pub use registration_repo::RegistrationRepository;
pub use user_repo::UserRepository;

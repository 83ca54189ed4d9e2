use uuid::Uuid;

/// Contact details used for order notifications.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

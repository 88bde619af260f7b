use chrono::{DateTime, Utc};

// Mocking out time so that it is possible to run tests that depend on time.
pub trait ISys: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System that gets the real time and is used when not testing
pub struct RealSys {}
impl ISys for RealSys {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System frozen at a given instant
pub struct FixedSys(pub DateTime<Utc>);
impl ISys for FixedSys {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

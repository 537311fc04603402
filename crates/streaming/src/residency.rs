/// Lifecycle of one image URL within a session.
///
/// Requested → Loading → Resident | Failed. `Resident` is final; a `Failed`
/// URL may be requested again.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResidencyState {
    Requested,
    Loading,
    Resident,
    Failed,
}

impl ResidencyState {
    pub fn is_final(self) -> bool {
        self == ResidencyState::Resident
    }
}

use crate::HalResult;

pub trait PrivilegeOps {
    /// Fails with [`crate::HalError::NotRoot`] unless the effective uid is 0.
    fn ensure_root(&self) -> HalResult<()>;
}

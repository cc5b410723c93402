/// Host platform introspection.
pub trait Platform: Send + Sync {
    fn is_windows(&self) -> bool;
}

/// The platform this binary was compiled for.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPlatform;

impl Platform for HostPlatform {
    fn is_windows(&self) -> bool {
        cfg!(windows)
    }
}

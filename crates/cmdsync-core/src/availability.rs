use crate::types::Service;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Answers whether a service's tooling is present on this host.
pub trait AvailabilityDetector {
    fn is_available(&self, service: Service) -> bool;
}

/// Checks the home directory (and, on macOS, `/Applications`) for each
/// service's footprint.
pub struct HostDetector {
    home: PathBuf,
}

impl HostDetector {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn markers(&self, service: Service) -> Vec<PathBuf> {
        let mut markers = vec![match service {
            Service::Claude => self.home.join(".claude"),
            Service::Cursor => self.home.join(".cursor"),
            Service::Windsurf => self.home.join(".codeium/windsurf"),
        }];
        if cfg!(target_os = "macos") {
            let app = match service {
                Service::Claude => "Claude.app",
                Service::Cursor => "Cursor.app",
                Service::Windsurf => "Windsurf.app",
            };
            markers.push(Path::new("/Applications").join(app));
        }
        markers
    }
}

impl AvailabilityDetector for HostDetector {
    fn is_available(&self, service: Service) -> bool {
        self.markers(service).iter().any(|p| p.exists())
    }
}

/// Fixed answer, e.g. from configuration or in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAvailability(pub BTreeSet<Service>);

impl StaticAvailability {
    pub fn all() -> Self {
        Self(Service::all().iter().copied().collect())
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl AvailabilityDetector for StaticAvailability {
    fn is_available(&self, service: Service) -> bool {
        self.0.contains(&service)
    }
}

pub fn available_services(detector: &dyn AvailabilityDetector) -> BTreeSet<Service> {
    Service::all()
        .iter()
        .copied()
        .filter(|s| detector.is_available(*s))
        .collect()
}

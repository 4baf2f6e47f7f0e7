//! Dependency resolution seam.
//!
//! Whether a dependency can actually be satisfied is a question about the
//! host's module universe, not about the text. The model only asks; hosts
//! answer through this trait.

use modfile_common::ModuleName;

pub trait DependencyResolver {
    /// Whether some module satisfies `name` under the given version
    /// requirement. `None` means any version.
    fn resolve(&self, name: &ModuleName, version_requirement: Option<&str>) -> bool;
}

impl<F> DependencyResolver for F
where
    F: Fn(&ModuleName, Option<&str>) -> bool,
{
    fn resolve(&self, name: &ModuleName, version_requirement: Option<&str>) -> bool {
        self(name, version_requirement)
    }
}

/// Resolver that considers everything satisfied. The default for models
/// built without a host-provided resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl DependencyResolver for AcceptAll {
    fn resolve(&self, _name: &ModuleName, _version_requirement: Option<&str>) -> bool {
        true
    }
}

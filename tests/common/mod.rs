use std::sync::Arc;

use dogu_registry::MemKeysApi;
use dogu_registry::RegistrySettings;
use dogu_registry::RetryPolicy;
use dogu_registry::StoreRegistry;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Registry on an in-process store, with a short constant retry so failing
/// cases stay fast.
pub fn in_memory_registry() -> StoreRegistry {
    enable_logger();
    let settings = RegistrySettings {
        retry: RetryPolicy::constant(10, 2),
        ..RegistrySettings::default()
    };
    StoreRegistry::with_keys_api(Arc::new(MemKeysApi::new()), &settings)
}

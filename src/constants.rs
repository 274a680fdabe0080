// -
// Store namespaces

pub const GLOBAL_CONFIG_KEY: &str = "/config/_global";
pub const HOST_CONFIG_KEY: &str = "/config/_host";
pub const DOGU_CONFIG_KEY: &str = "/config";

/// Legacy (v1) dogu registry root
pub const DOGU_V1_KEY: &str = "/dogu";
/// Current (v2) dogu registry root
pub const DOGU_V2_KEY: &str = "/dogu_v2";

pub const STATE_KEY: &str = "/state";
pub const BLUEPRINT_KEY: &str = "/blueprint";

/// Active version pointer below `<registry root>/<dogu>`
pub const CURRENT_KEY: &str = "current";

mod common;
mod configuration;
mod dogu_versions;
mod watch;

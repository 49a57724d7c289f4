mod spec;
pub use spec::JobSpec;

mod handle;
pub use handle::JobHandle;

mod resources;
pub use resources::ResourceRequests;

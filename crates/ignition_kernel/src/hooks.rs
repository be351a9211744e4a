//! Collaborator hooks invoked during assembly.

use ignition_container::{ConfigurationLoadError, GraphBuilder};

use crate::container::Container;
use crate::http::RequestHandler;

/// The collaborator interface a concrete kernel supplies.
///
/// [`build`](Self::build) is the registration hook: it runs before any
/// external configuration is loaded and typically registers the
/// request-handler binding and any compiler passes. [`configure`](Self::configure)
/// is the loading hook: it drives whatever loader chain the application
/// uses and populates further definitions. Both must be idempotent and
/// side-effect-free beyond populating the graph.
pub trait KernelHooks {
    /// Registers definitions and compiler passes on the empty graph.
    fn build(&self, graph: &mut GraphBuilder) {
        let _ = graph;
    }

    /// Loads external configuration into the graph.
    fn configure(&self, graph: &mut GraphBuilder) -> Result<(), ConfigurationLoadError> {
        let _ = graph;
        Ok(())
    }

    /// Materializes the request handler the container advertises.
    ///
    /// Called once, and only when the container has a definition under
    /// [`REQUEST_HANDLER_ID`](crate::REQUEST_HANDLER_ID). Returning `None`
    /// falls back to the kernel's built-in response.
    fn request_handler(&self, container: &Container) -> Option<Box<dyn RequestHandler>> {
        let _ = container;
        None
    }
}

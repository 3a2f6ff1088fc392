/*!
 * Monitoring
 * Structured logging setup for binaries embedding the notifier
 */

mod tracer;

pub use tracer::init_tracing;

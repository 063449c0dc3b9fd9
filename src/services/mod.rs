pub mod reconciler;

pub use reconciler::reconcile;

/// Declares the renderer of a view type.
///
/// Implements [`RenderedBy`](crate::RenderedBy) so the binding can be collected
/// with [`RegistryBuilder::declare`](crate::RegistryBuilder::declare).
///
/// # Usage
///
/// ```ignore
/// declare_renderer!(Button => NativeButtonRenderer);
///
/// let mut builder = RendererRegistry::builder();
/// builder.declare::<Button>()?;
/// ```
#[macro_export]
macro_rules! declare_renderer {
    ($view:ty => $renderer:ty) => {
        impl $crate::RenderedBy for $view {
            type Renderer = $renderer;
        }
    };
}

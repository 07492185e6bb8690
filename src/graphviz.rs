use crate::graph::Graph;
use crate::layout::{AttributeDelta, LayoutError, LayoutStore, Target};
use crate::render;
use crate::viewer::Viewer;
use crate::{OutputFormat, RenderOptions};
use anyhow::Result;
use std::path::PathBuf;

/// Rendering session for one graph: layout overrides, output options and viewer state
#[derive(Debug)]
pub struct GraphViz<'g> {
    graph: &'g Graph,
    layout: LayoutStore,
    options: RenderOptions,
    viewer: Viewer,
}

impl<'g> GraphViz<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self::with_layout(graph, LayoutStore::new())
    }

    /// Resume a session with overrides kept from an earlier one.
    /// Entries of objects that have since been removed are discarded.
    pub fn with_layout(graph: &'g Graph, mut layout: LayoutStore) -> Self {
        let pruned = layout.prune(graph);
        if pruned > 0 {
            tracing::debug!(pruned, "discarded overrides of removed objects");
        }
        Self {
            graph,
            layout,
            options: RenderOptions::default(),
            viewer: Viewer::default(),
        }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn layout(&self) -> &LayoutStore {
        &self.layout
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn set_format(&mut self, format: OutputFormat) -> &mut Self {
        self.options.format = format;
        self
    }

    /// Merge `delta` into every scope addressed by `target`.
    /// Nothing is applied unless every object in `target` belongs to this graph.
    pub fn set_attributes(
        &mut self,
        target: impl Into<Target>,
        delta: &AttributeDelta,
    ) -> Result<&mut Self, LayoutError> {
        let target = target.into();
        for single in target.flatten() {
            match single {
                Target::Vertex(v) if !self.graph.contains_vertex(*v) => {
                    return Err(LayoutError::InvalidTargetKind(v.to_string()));
                }
                Target::Edge(e) if !self.graph.contains_edge(*e) => {
                    return Err(LayoutError::InvalidTargetKind(e.to_string()));
                }
                _ => {}
            }
        }
        self.layout.set_attributes(target, delta);
        Ok(self)
    }

    pub fn create_script(&self) -> String {
        crate::script::create_script(self.graph, &self.layout)
    }

    pub fn create_image_file(&self) -> Result<PathBuf> {
        render::create_image_file(&self.create_script(), &self.options)
    }

    pub fn create_image_data(&self) -> Result<Vec<u8>> {
        render::create_image_data(&self.create_script(), &self.options)
    }

    pub fn create_image_src(&self) -> Result<String> {
        render::create_image_src(&self.create_script(), &self.options)
    }

    pub fn create_image_html(&self) -> Result<String> {
        render::create_image_html(&self.create_script(), &self.options)
    }

    /// Render to a file and open it in the desktop viewer.
    /// The file is left in place for the viewer.
    pub fn display(&mut self) -> Result<()> {
        let path = self.create_image_file()?;
        self.viewer.open(&path)
    }

    /// End the session, keeping the overrides for a later one
    pub fn into_layout(self) -> LayoutStore {
        self.layout
    }
}

//! Filter graph model
//!
//! Pipelines are built as typed values and only rendered to ffmpeg's
//! `-filter_complex` syntax at the engine boundary.

use std::fmt;

/// Label of the final video pad
pub const VIDEO_OUT: &str = "vout";
/// Label of the final audio pad
pub const AUDIO_OUT: &str = "aout";

/// Stream kind a chain operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    /// Pass-through filter for this kind
    fn passthrough(&self) -> &'static str {
        match self {
            StreamKind::Video => "null",
            StreamKind::Audio => "anull",
        }
    }

    /// Stream specifier suffix used in input pads (`0:v`, `0:a`)
    pub fn specifier(&self) -> &'static str {
        match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
        }
    }
}

/// Render a float the way filter options expect it
pub fn num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// A single filter with its options
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    options: Vec<(Option<String>, String)>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
        }
    }

    /// Named option, rendered as `key=value`
    pub fn opt(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.options.push((Some(key.into()), value.to_string()));
        self
    }

    /// Positional option, rendered as the bare value
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.options.push((None, value.to_string()));
        self
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, (key, value)) in self.options.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            match key {
                Some(key) => write!(f, "{}={}", key, value)?,
                None => f.write_str(value)?,
            }
        }
        Ok(())
    }
}

/// Linear sequence of filters applied to one stream
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    kind: StreamKind,
    filters: Vec<Filter>,
}

impl Chain {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            filters: Vec::new(),
        }
    }

    pub fn video() -> Self {
        Self::new(StreamKind::Video)
    }

    pub fn audio() -> Self {
        Self::new(StreamKind::Audio)
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn then(mut self, filter: Filter) -> Self {
        self.push(filter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filters.is_empty() {
            return f.write_str(self.kind.passthrough());
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", filter)?;
        }
        Ok(())
    }
}

/// Video chain plus an audio chain when the source carries audio.
///
/// Owned by exactly one render and mutated stage by stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub video: Chain,
    pub audio: Option<Chain>,
}

impl Pipeline {
    pub fn new(has_audio: bool) -> Self {
        Self {
            video: Chain::video(),
            audio: has_audio.then(Chain::audio),
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Append a video filter
    pub fn video(&mut self, filter: Filter) {
        self.video.push(filter);
    }

    /// Append an audio filter; ignored when there is no audio stream
    pub fn audio(&mut self, filter: Filter) {
        if let Some(chain) = self.audio.as_mut() {
            chain.push(filter);
        }
    }

    /// Wire both chains to input `input` and the final output pads
    pub fn into_graph(self, input: usize) -> FilterGraph {
        let mut graph = FilterGraph::new();
        graph.add(
            vec![format!("{}:v", input)],
            self.video,
            vec![VIDEO_OUT.to_string()],
        );
        if let Some(audio) = self.audio {
            graph.add(
                vec![format!("{}:a", input)],
                audio,
                vec![AUDIO_OUT.to_string()],
            );
        }
        graph
    }
}

/// One labelled chain inside a filter graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub inputs: Vec<String>,
    pub chain: Chain,
    pub outputs: Vec<String>,
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "[{}]", input)?;
        }
        write!(f, "{}", self.chain)?;
        for output in &self.outputs {
            write!(f, "[{}]", output)?;
        }
        Ok(())
    }
}

/// Complete filter graph as passed to `-filter_complex`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraph {
    nodes: Vec<GraphNode>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, inputs: Vec<String>, chain: Chain, outputs: Vec<String>) {
        self.nodes.push(GraphNode {
            inputs,
            chain,
            outputs,
        });
    }

    /// Whether some node produces the given pad label
    pub fn produces(&self, label: &str) -> bool {
        self.nodes
            .iter()
            .any(|node| node.outputs.iter().any(|o| o == label))
    }

    /// Output pads to map into the container, video first
    pub fn output_maps(&self) -> Vec<String> {
        [VIDEO_OUT, AUDIO_OUT]
            .iter()
            .filter(|label| self.produces(label))
            .map(|label| format!("[{}]", label))
            .collect()
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

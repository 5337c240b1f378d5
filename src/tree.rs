//! Hierarchical directory/file model.
//!
//! Nodes live in two arenas owned by `CoverageTree`. Parents own children
//! through the `subdirs`/`files` maps; the `parent` field is a plain index
//! used only to walk upward.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::model::{CoverageMetrics, LineMetrics, MethodMetrics};

/// Handle to a directory node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirId(usize);

/// Handle to a file node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(usize);

#[derive(Debug, Clone)]
pub struct DirNode {
    pub name: String,
    /// Forward-slash path relative to the project root; "." for the root.
    pub path: String,
    pub subdirs: BTreeMap<String, DirId>,
    pub files: BTreeMap<String, FileId>,
    pub metrics: CoverageMetrics,
    pub parent: Option<DirId>,
}

#[derive(Debug, Clone)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    pub lines: BTreeMap<u32, LineMetrics>,
    pub methods: Vec<MethodMetrics>,
    pub metrics: CoverageMetrics,
    pub total_lines: u64,
    /// Source-root hint used to resolve this file on disk.
    pub source_dir: String,
    /// Path as first written by a report, before normalization.
    pub report_path: String,
    pub parent: DirId,
}

#[derive(Debug, Clone)]
pub struct CoverageTree {
    dirs: Vec<DirNode>,
    files: Vec<FileNode>,
    pub metrics: CoverageMetrics,
    /// Unix seconds at build time.
    pub timestamp: i64,
    pub parser_name: String,
}

pub const ROOT_PATH: &str = ".";

/// Split a report path into tree segments.
///
/// Backslashes become forward slashes; empty and `.` segments are dropped.
/// `..` removes the preceding segment and is dropped at the root, so no
/// node ever sits above the project root.
pub fn path_segments(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for segment in path.replace('\\', "/").split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment.to_string()),
        }
    }
    segments
}

fn join_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

impl CoverageTree {
    pub fn new(parser_name: impl Into<String>, timestamp: i64) -> Self {
        let root = DirNode {
            name: String::new(),
            path: ROOT_PATH.to_string(),
            subdirs: BTreeMap::new(),
            files: BTreeMap::new(),
            metrics: CoverageMetrics::default(),
            parent: None,
        };
        Self {
            dirs: vec![root],
            files: Vec::new(),
            metrics: CoverageMetrics::default(),
            timestamp,
            parser_name: parser_name.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> DirId {
        DirId(0)
    }

    #[must_use]
    pub fn dir(&self, id: DirId) -> &DirNode {
        &self.dirs[id.0]
    }

    pub fn dir_mut(&mut self, id: DirId) -> &mut DirNode {
        &mut self.dirs[id.0]
    }

    #[must_use]
    pub fn file(&self, id: FileId) -> &FileNode {
        &self.files[id.0]
    }

    pub fn file_mut(&mut self, id: FileId) -> &mut FileNode {
        &mut self.files[id.0]
    }

    /// All file handles, in insertion order.
    pub fn file_ids(&self) -> impl Iterator<Item = FileId> {
        (0..self.files.len()).map(FileId)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.files.iter()
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    /// Look up or create the child directory `name` under `parent`.
    pub fn ensure_dir(&mut self, parent: DirId, name: &str) -> DirId {
        if let Some(&id) = self.dirs[parent.0].subdirs.get(name) {
            return id;
        }
        let id = DirId(self.dirs.len());
        let path = join_path(&self.dirs[parent.0].path, name);
        self.dirs.push(DirNode {
            name: name.to_string(),
            path,
            subdirs: BTreeMap::new(),
            files: BTreeMap::new(),
            metrics: CoverageMetrics::default(),
            parent: Some(parent),
        });
        self.dirs[parent.0].subdirs.insert(name.to_string(), id);
        id
    }

    /// Walk/create the directory chain for `segments[..len-1]` and locate or
    /// create the terminal file node. Returns `None` when there are no
    /// segments.
    pub fn file_entry(&mut self, segments: &[String]) -> Option<FileId> {
        let (file_name, dir_segments) = segments.split_last()?;
        let mut dir = self.root();
        for segment in dir_segments {
            dir = self.ensure_dir(dir, segment);
        }
        if let Some(&id) = self.dirs[dir.0].files.get(file_name) {
            return Some(id);
        }
        let id = FileId(self.files.len());
        let path = join_path(&self.dirs[dir.0].path, file_name);
        self.files.push(FileNode {
            name: file_name.clone(),
            path,
            lines: BTreeMap::new(),
            methods: Vec::new(),
            metrics: CoverageMetrics::default(),
            total_lines: 0,
            source_dir: String::new(),
            report_path: String::new(),
            parent: dir,
        });
        self.dirs[dir.0].files.insert(file_name.clone(), id);
        Some(id)
    }

    /// Find a file by its (report or tree) path.
    #[must_use]
    pub fn find_file(&self, path: &str) -> Option<FileId> {
        let segments = path_segments(path);
        let (file_name, dir_segments) = segments.split_last()?;
        let mut dir = self.root();
        for segment in dir_segments {
            dir = *self.dirs[dir.0].subdirs.get(segment)?;
        }
        self.dirs[dir.0].files.get(file_name).copied()
    }

    /// Find a directory by its tree path ("." for the root).
    #[must_use]
    pub fn find_dir(&self, path: &str) -> Option<DirId> {
        let mut dir = self.root();
        for segment in path_segments(path) {
            dir = *self.dirs[dir.0].subdirs.get(&segment)?;
        }
        Some(dir)
    }

    /// Directories containing `file`, nearest first, ending at the root.
    #[must_use]
    pub fn ancestors(&self, file: FileId) -> Vec<DirId> {
        let mut chain = Vec::new();
        let mut current = Some(self.files[file.0].parent);
        while let Some(id) = current {
            chain.push(id);
            current = self.dirs[id.0].parent;
        }
        chain
    }
}

// Renderers consume the tree as nested maps, so serialization walks the
// arena from the root rather than dumping the flat vectors.

struct DirView<'a> {
    tree: &'a CoverageTree,
    id: DirId,
}

struct SubdirsView<'a> {
    tree: &'a CoverageTree,
    id: DirId,
}

struct FilesView<'a> {
    tree: &'a CoverageTree,
    id: DirId,
}

impl Serialize for DirView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let dir = self.tree.dir(self.id);
        let mut state = serializer.serialize_struct("DirNode", 5)?;
        state.serialize_field("name", &dir.name)?;
        state.serialize_field("path", &dir.path)?;
        state.serialize_field("metrics", &dir.metrics)?;
        state.serialize_field(
            "subdirs",
            &SubdirsView {
                tree: self.tree,
                id: self.id,
            },
        )?;
        state.serialize_field(
            "files",
            &FilesView {
                tree: self.tree,
                id: self.id,
            },
        )?;
        state.end()
    }
}

impl Serialize for SubdirsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let subdirs = &self.tree.dir(self.id).subdirs;
        let mut map = serializer.serialize_map(Some(subdirs.len()))?;
        for (name, &id) in subdirs {
            map.serialize_entry(
                name,
                &DirView {
                    tree: self.tree,
                    id,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for FilesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let files = &self.tree.dir(self.id).files;
        let mut map = serializer.serialize_map(Some(files.len()))?;
        for (name, &id) in files {
            map.serialize_entry(name, self.tree.file(id))?;
        }
        map.end()
    }
}

impl Serialize for FileNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FileNode", 7)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("metrics", &self.metrics)?;
        state.serialize_field("lines", &self.lines)?;
        state.serialize_field("methods", &self.methods)?;
        state.serialize_field("total_lines", &self.total_lines)?;
        state.serialize_field("source_dir", &self.source_dir)?;
        state.end()
    }
}

impl Serialize for CoverageTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CoverageTree", 4)?;
        state.serialize_field(
            "root",
            &DirView {
                tree: self,
                id: self.root(),
            },
        )?;
        state.serialize_field("metrics", &self.metrics)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("parser_name", &self.parser_name)?;
        state.end()
    }
}

//! Portable tree container.
//!
//! A self-describing binary file: the whole node tree serialized as
//! named-field MessagePack. Groups hold attributes and name-ordered children;
//! datasets hold attributes, an element type, a shape and a raw little-endian
//! payload.
//!
//! Source handles decode the file once on open. Destination handles keep the
//! tree in memory and write it out on [`Container::close`], so a run that is
//! abandoned half-way still leaves whatever was copied on disk.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{path_segments, Container, Format, Node, StoreError};

const MAGIC: &str = "h5strip-tree";
const VERSION: u32 = 1;

/// Element type of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dtype {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Fixed-length byte string of the given width.
    FixedString(usize),
    /// Reference to another object in the same file.
    ObjectRef,
}

impl Dtype {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Dtype::Bool | Dtype::Int8 | Dtype::UInt8 => 1,
            Dtype::Int16 | Dtype::UInt16 => 2,
            Dtype::Int32 | Dtype::UInt32 | Dtype::Float32 => 4,
            Dtype::Int64 | Dtype::UInt64 | Dtype::Float64 | Dtype::ObjectRef => 8,
            Dtype::FixedString(n) => n,
        }
    }
}

/// Attribute value attached to a group or dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
}

pub type Attrs = BTreeMap<String, AttrValue>;

/// A typed, shaped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dtype: Dtype,
    /// Empty for scalars.
    pub shape: Vec<usize>,
    pub attrs: Attrs,
    pub data: Vec<u8>,
}

impl Dataset {
    /// Build a dataset from raw bytes. The layout is not checked here; a
    /// mismatched payload is reported when the dataset is copied.
    pub fn new(dtype: Dtype, shape: Vec<usize>, data: Vec<u8>) -> Self {
        Self {
            dtype,
            shape,
            attrs: Attrs::new(),
            data,
        }
    }

    pub fn from_f64(shape: &[usize], values: &[f64]) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(Dtype::Float64, shape.to_vec(), data)
    }

    pub fn from_u16(shape: &[usize], values: &[u16]) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(Dtype::UInt16, shape.to_vec(), data)
    }

    pub fn scalar_f64(value: f64) -> Self {
        Self::from_f64(&[], &[value])
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Number of elements; a scalar holds one. `None` when the shape does
    /// not fit in `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Payload size in bytes implied by shape and element type.
    pub fn expected_len(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.dtype.size())
    }

    /// Decode a `Float64` payload. `None` for any other element type.
    pub fn values_f64(&self) -> Option<Vec<f64>> {
        if self.dtype != Dtype::Float64 {
            return None;
        }
        Some(
            self.data
                .chunks_exact(8)
                .map(|c| {
                    let mut b = [0u8; 8];
                    b.copy_from_slice(c);
                    f64::from_le_bytes(b)
                })
                .collect(),
        )
    }

    /// Reject datasets that cannot be placed into another container as-is.
    fn check_copyable(&self, path: &str) -> Result<(), StoreError> {
        if self.dtype == Dtype::ObjectRef {
            return Err(StoreError::Unsupported {
                path: path.to_string(),
                reason: "object references cannot be copied into another container".into(),
            });
        }
        let Some(expected) = self.expected_len() else {
            return Err(StoreError::Unsupported {
                path: path.to_string(),
                reason: format!(
                    "shape {:?} of {:?} is too large to address",
                    self.shape, self.dtype
                ),
            });
        };
        if self.data.len() != expected {
            return Err(StoreError::LayoutMismatch {
                path: path.to_string(),
                shape: self.shape.clone(),
                dtype: format!("{:?}", self.dtype),
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub attrs: Attrs,
    pub children: BTreeMap<String, TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Group(Group),
    Dataset(Dataset),
}

#[derive(Serialize, Deserialize)]
struct Document {
    magic: String,
    version: u32,
    root: Group,
}

/// Handle to a tree container, either loaded from disk or bound to an output
/// file that is written on close.
#[derive(Debug)]
pub struct TreeFile {
    root: Group,
    sink: Option<Sink>,
}

#[derive(Debug)]
struct Sink {
    path: PathBuf,
    file: File,
}

impl TreeFile {
    /// Empty container not bound to any file.
    pub fn in_memory() -> Self {
        Self {
            root: Group::default(),
            sink: None,
        }
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Look up any node by absolute path. The root itself is not addressable.
    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        let segments = path_segments(path);
        let (last, parents) = segments.split_last()?;
        let mut group = &self.root;
        for seg in parents {
            match group.children.get(*seg)? {
                TreeNode::Group(g) => group = g,
                TreeNode::Dataset(_) => return None,
            }
        }
        group.children.get(*last)
    }

    pub fn dataset(&self, path: &str) -> Option<&Dataset> {
        match self.get(path)? {
            TreeNode::Dataset(d) => Some(d),
            TreeNode::Group(_) => None,
        }
    }

    pub fn group(&self, path: &str) -> Option<&Group> {
        match self.get(path)? {
            TreeNode::Group(g) => Some(g),
            TreeNode::Dataset(_) => None,
        }
    }

    /// Every dataset path in traversal order.
    pub fn dataset_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        walk(&self.root, "", &mut |node| {
            if let Node::Dataset { path, .. } = node {
                out.push(path);
            }
        });
        out
    }

    /// Place a dataset at `path`, creating missing groups on the way.
    pub fn insert_dataset(&mut self, path: &str, dataset: Dataset) -> Result<(), StoreError> {
        let segments = path_segments(path);
        let Some((last, parents)) = segments.split_last() else {
            return Err(StoreError::Unsupported {
                path: path.to_string(),
                reason: "a dataset cannot replace the root group".into(),
            });
        };
        // Check before touching the tree so a collision leaves no empty shells.
        self.check_insertable(path, parents, last)?;

        let mut group = &mut self.root;
        for seg in parents {
            let child = group
                .children
                .entry((*seg).to_string())
                .or_insert_with(|| TreeNode::Group(Group::default()));
            group = match child {
                TreeNode::Group(g) => g,
                TreeNode::Dataset(_) => {
                    return Err(StoreError::NameCollision {
                        path: path.to_string(),
                        existing: (*seg).to_string(),
                    });
                }
            };
        }
        group
            .children
            .insert((*last).to_string(), TreeNode::Dataset(dataset));
        Ok(())
    }

    /// Create an (empty) group and any missing ancestors.
    pub fn insert_group(&mut self, path: &str) -> Result<(), StoreError> {
        let mut group = &mut self.root;
        let mut walked = String::new();
        for seg in path_segments(path) {
            walked.push('/');
            walked.push_str(seg);
            let child = group
                .children
                .entry(seg.to_string())
                .or_insert_with(|| TreeNode::Group(Group::default()));
            group = match child {
                TreeNode::Group(g) => g,
                TreeNode::Dataset(_) => {
                    return Err(StoreError::NameCollision {
                        path: path.to_string(),
                        existing: walked,
                    });
                }
            };
        }
        Ok(())
    }

    /// Set an attribute on an existing group (`"/"` addresses the root).
    pub fn set_group_attr(
        &mut self,
        path: &str,
        name: impl Into<String>,
        value: AttrValue,
    ) -> Result<(), StoreError> {
        let mut group = &mut self.root;
        for seg in path_segments(path) {
            group = match group.children.get_mut(seg) {
                Some(TreeNode::Group(g)) => g,
                _ => {
                    return Err(StoreError::Unsupported {
                        path: path.to_string(),
                        reason: "no group at this path".into(),
                    });
                }
            };
        }
        group.attrs.insert(name.into(), value);
        Ok(())
    }

    /// Write the tree to `path` as a standalone container file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = encode(&self.root, path)?;
        fs::write(path, bytes).map_err(|e| StoreError::io(path, e))
    }

    fn check_insertable(&self, path: &str, parents: &[&str], last: &str) -> Result<(), StoreError> {
        let mut group = &self.root;
        let mut walked = String::new();
        for seg in parents {
            walked.push('/');
            walked.push_str(seg);
            match group.children.get(*seg) {
                None => return Ok(()),
                Some(TreeNode::Group(g)) => group = g,
                Some(TreeNode::Dataset(_)) => {
                    return Err(StoreError::NameCollision {
                        path: path.to_string(),
                        existing: walked,
                    });
                }
            }
        }
        if group.children.contains_key(last) {
            return Err(StoreError::NameCollision {
                path: path.to_string(),
                existing: path.to_string(),
            });
        }
        Ok(())
    }
}

impl Container for TreeFile {
    fn open(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        let doc: Document = rmp_serde::from_slice(&bytes).map_err(|e| corrupt(path, e.to_string()))?;
        if doc.magic != MAGIC {
            return Err(corrupt(path, format!("unexpected magic {:?}", doc.magic)));
        }
        if doc.version != VERSION {
            return Err(corrupt(path, format!("unsupported version {}", doc.version)));
        }
        Ok(Self {
            root: doc.root,
            sink: None,
        })
    }

    fn create(path: &Path) -> Result<Self, StoreError> {
        let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
        Ok(Self {
            root: Group::default(),
            sink: Some(Sink {
                path: path.to_path_buf(),
                file,
            }),
        })
    }

    fn visit(&self, visitor: &mut dyn FnMut(Node)) -> Result<(), StoreError> {
        walk(&self.root, "", visitor);
        Ok(())
    }

    fn copy_dataset(&self, path: &str, dest: &mut Self) -> Result<(), StoreError> {
        let dataset = self
            .dataset(path)
            .ok_or_else(|| StoreError::MissingDataset(path.to_string()))?;
        dataset.check_copyable(path)?;
        dest.insert_dataset(path, dataset.clone())
    }

    fn close(self) -> Result<(), StoreError> {
        let Some(mut sink) = self.sink else {
            return Ok(());
        };
        let bytes = encode(&self.root, &sink.path)?;
        sink.file
            .write_all(&bytes)
            .and_then(|()| sink.file.sync_all())
            .map_err(|e| StoreError::io(&sink.path, e))
    }
}

/// Pre-order walk, children in name order.
fn walk(group: &Group, prefix: &str, visitor: &mut dyn FnMut(Node)) {
    for (name, child) in &group.children {
        let path = format!("{prefix}/{name}");
        match child {
            TreeNode::Group(g) => {
                visitor(Node::Group { path: path.clone() });
                walk(g, &path, visitor);
            }
            TreeNode::Dataset(d) => visitor(Node::Dataset {
                path,
                shape: d.shape.clone(),
            }),
        }
    }
}

fn encode(root: &Group, path: &Path) -> Result<Vec<u8>, StoreError> {
    let doc = Document {
        magic: MAGIC.to_string(),
        version: VERSION,
        root: root.clone(),
    };
    rmp_serde::to_vec_named(&doc).map_err(|e| corrupt(path, e.to_string()))
}

fn corrupt(path: &Path, reason: String) -> StoreError {
    StoreError::Corrupt {
        path: path.to_path_buf(),
        format: Format::Tree,
        reason,
    }
}

// crates/mv_io/src/store.rs

//! 数组存储后端
//!
//! 核心消费的窄接口：按键读写带形状的命名数组。具体格式细节
//! （HDF5 等）超出范围，这里提供内存实现与原始文件实现。

use mv_data::array::{make_array, DataArray, ScalarType};
use mv_foundation::error::{MvError, MvResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// 存储后端trait
pub trait ArrayStore: Send + Sync {
    /// 写入数组
    fn write_array(&self, key: &str, array: &dyn DataArray) -> MvResult<()>;

    /// 读取数组
    fn read_array(&self, key: &str) -> MvResult<Box<dyn DataArray>>;

    /// 是否存在
    fn contains(&self, key: &str) -> MvResult<bool>;

    /// 列出全部键
    fn list(&self) -> MvResult<Vec<String>>;

    /// 删除
    fn remove(&self, key: &str) -> MvResult<()>;
}

/// 内存存储
#[derive(Default)]
pub struct MemoryStore {
    arrays: RwLock<HashMap<String, Box<dyn DataArray>>>,
}

impl MemoryStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前数组数量
    pub fn len(&self) -> usize {
        self.arrays.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.arrays.read().is_empty()
    }
}

impl ArrayStore for MemoryStore {
    fn write_array(&self, key: &str, array: &dyn DataArray) -> MvResult<()> {
        self.arrays
            .write()
            .insert(key.to_string(), array.clone_boxed());
        Ok(())
    }

    fn read_array(&self, key: &str) -> MvResult<Box<dyn DataArray>> {
        self.arrays
            .read()
            .get(key)
            .map(|a| a.clone_boxed())
            .ok_or_else(|| MvError::not_found(key))
    }

    fn contains(&self, key: &str) -> MvResult<bool> {
        Ok(self.arrays.read().contains_key(key))
    }

    fn list(&self) -> MvResult<Vec<String>> {
        Ok(self.arrays.read().keys().cloned().collect())
    }

    fn remove(&self, key: &str) -> MvResult<()> {
        self.arrays.write().remove(key);
        Ok(())
    }
}

/// 文件存储的数组元数据（JSON 旁车文件）
#[derive(Debug, Serialize, Deserialize)]
struct ArrayMeta {
    name: String,
    scalar_type: ScalarType,
    num_tuples: usize,
    num_components: usize,
}

/// 文件存储
///
/// 每个键对应一对文件：`<key>.bin` 原始字节载荷与 `<key>.json`
/// 元数据旁车。
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// 在目录下创建文件存储
    pub fn new(root: impl Into<PathBuf>) -> MvResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn bin_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.bin", key))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl ArrayStore for FileStore {
    fn write_array(&self, key: &str, array: &dyn DataArray) -> MvResult<()> {
        let meta = ArrayMeta {
            name: array.name().to_string(),
            scalar_type: array.scalar_type(),
            num_tuples: array.num_tuples(),
            num_components: array.num_components(),
        };
        let meta_json =
            serde_json::to_string_pretty(&meta).map_err(|e| MvError::serialization(e.to_string()))?;
        fs::write(self.meta_path(key), meta_json)?;
        fs::write(self.bin_path(key), array.as_bytes())?;
        tracing::debug!(
            "Wrote array '{}' ({} tuples) to {}",
            array.name(),
            array.num_tuples(),
            self.bin_path(key).display()
        );
        Ok(())
    }

    fn read_array(&self, key: &str) -> MvResult<Box<dyn DataArray>> {
        let meta_path = self.meta_path(key);
        if !meta_path.exists() {
            return Err(MvError::not_found(key));
        }
        let meta_json = fs::read_to_string(&meta_path)?;
        let meta: ArrayMeta =
            serde_json::from_str(&meta_json).map_err(|e| MvError::serialization(e.to_string()))?;

        let bytes = fs::read(self.bin_path(key))?;
        // 载荷长度必须与元数据声明的形状一致，否则旁车文件已不同步
        let expected = meta.num_tuples * meta.num_components * meta.scalar_type.size_of();
        MvError::check_size(&meta.name, expected, bytes.len())?;
        let mut array = make_array(
            meta.name,
            meta.scalar_type,
            meta.num_tuples,
            meta.num_components,
        );
        array.copy_from_bytes(&bytes)?;
        Ok(array)
    }

    fn contains(&self, key: &str) -> MvResult<bool> {
        Ok(self.meta_path(key).exists())
    }

    fn list(&self) -> MvResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn remove(&self, key: &str) -> MvResult<()> {
        let meta = self.meta_path(key);
        let bin = self.bin_path(key);
        if meta.exists() {
            fs::remove_file(meta)?;
        }
        if bin.exists() {
            fs::remove_file(bin)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv_data::array::{downcast_array, TypedArray};

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let array = TypedArray::<i32>::from_vec("FeatureIds", 1, vec![1, 1, 2, 2]).unwrap();
        store.write_array("cell/FeatureIds", &array).unwrap();

        assert!(store.contains("cell/FeatureIds").unwrap());
        let back = store.read_array("cell/FeatureIds").unwrap();
        let typed = downcast_array::<i32>(back.as_ref()).unwrap();
        assert_eq!(typed.as_slice(), &[1, 1, 2, 2]);
    }

    #[test]
    fn test_memory_store_missing_key() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.read_array("nope"),
            Err(MvError::NotFound { .. })
        ));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let array =
            TypedArray::<f32>::from_vec("EulerAngles", 3, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6])
                .unwrap();
        store.write_array("euler", &array).unwrap();

        let back = store.read_array("euler").unwrap();
        assert_eq!(back.name(), "EulerAngles");
        assert_eq!(back.num_tuples(), 2);
        assert_eq!(back.num_components(), 3);
        let typed = downcast_array::<f32>(back.as_ref()).unwrap();
        assert_eq!(typed.as_slice(), array.as_slice());
    }

    /// 载荷与元数据形状不符时读取必须报 SizeMismatch 而非构造残缺数组
    #[test]
    fn test_file_store_truncated_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let array = TypedArray::<i32>::from_vec("FeatureIds", 1, vec![1, 2, 3, 4]).unwrap();
        store.write_array("ids", &array).unwrap();

        // 截断 .bin 载荷，模拟不同步的旁车文件
        let bin = dir.path().join("ids.bin");
        let bytes = std::fs::read(&bin).unwrap();
        std::fs::write(&bin, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(
            store.read_array("ids"),
            Err(MvError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_file_store_list_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let a = TypedArray::<u8>::from_vec("Mask", 1, vec![1, 0, 1]).unwrap();
        store.write_array("mask", &a).unwrap();
        assert_eq!(store.list().unwrap(), vec!["mask".to_string()]);

        store.remove("mask").unwrap();
        assert!(!store.contains("mask").unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}

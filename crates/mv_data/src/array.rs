// crates/mv_data/src/array.rs

//! 数据数组
//!
//! 提供带类型标签、可调整大小、多分量的连续存储单元。
//! 一个数组由若干元组(tuple)组成，每个元组包含固定数量的分量(component)。
//!
//! # 不变量
//!
//! 任何修改操作完成后，底层存储长度恒等于 `num_tuples * num_components`。

use bytemuck::Pod;
use mv_foundation::error::{MvError, MvResult};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// 元素类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// 8位无符号整数
    U8,
    /// 8位有符号整数
    I8,
    /// 16位无符号整数
    U16,
    /// 16位有符号整数
    I16,
    /// 32位无符号整数
    U32,
    /// 32位有符号整数
    I32,
    /// 64位无符号整数
    U64,
    /// 64位有符号整数
    I64,
    /// 单精度浮点
    F32,
    /// 双精度浮点
    F64,
}

impl ScalarType {
    /// 类型名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// 单个元素的字节数
    pub fn size_of(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 可作为数组元素的标量类型
pub trait Scalar: Pod + Default + PartialEq + Send + Sync + 'static {
    /// 对应的类型标签
    const SCALAR_TYPE: ScalarType;
}

macro_rules! impl_scalar {
    ($($t:ty => $tag:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const SCALAR_TYPE: ScalarType = ScalarType::$tag;
            }
        )*
    };
}

impl_scalar!(
    u8 => U8, i8 => I8, u16 => U16, i16 => I16,
    u32 => U32, i32 => I32, u64 => U64, i64 => I64,
    f32 => F32, f64 => F64,
);

/// 数据数组 trait
///
/// 类型擦除的数组接口，属性矩阵通过它统一管理异构数组。
/// 具体类型访问通过 [`DataArray::as_any`] 向下转型到 [`TypedArray`]。
pub trait DataArray: Send + Sync {
    /// 数组名称（在所属属性矩阵内唯一）
    fn name(&self) -> &str;

    /// 元素类型标签
    fn scalar_type(&self) -> ScalarType;

    /// 元组数量
    fn num_tuples(&self) -> usize;

    /// 每元组的分量数量
    fn num_components(&self) -> usize;

    /// 调整元组数量
    ///
    /// 重新分配存储；缩小时截断，增大时补零。调用方如需保留映射关系
    /// 必须自行复制/重索引。
    fn resize_tuples(&mut self, num_tuples: usize);

    /// 全部填零
    fn fill_zero(&mut self);

    /// 创建同名同类型同分量数、指定元组数的空(零填充)数组
    fn create_compatible(&self, num_tuples: usize) -> Box<dyn DataArray>;

    /// 深拷贝
    fn clone_boxed(&self) -> Box<dyn DataArray>;

    /// 从另一数组复制一个完整元组(整个分量块)
    ///
    /// 源数组必须具有相同的元素类型与分量数，否则返回类型不匹配错误；
    /// 任一索引越界返回越界错误。
    fn copy_tuple(&mut self, dst_tuple: usize, src: &dyn DataArray, src_tuple: usize)
        -> MvResult<()>;

    /// 按字节查看底层存储
    fn as_bytes(&self) -> &[u8];

    /// 从字节切片整体覆盖底层存储
    ///
    /// 字节长度必须恰好等于当前存储大小。
    fn copy_from_bytes(&mut self, bytes: &[u8]) -> MvResult<()>;

    /// 向下转型支持
    fn as_any(&self) -> &dyn Any;

    /// 向下转型支持（可变）
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn DataArray> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl std::fmt::Debug for Box<dyn DataArray> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataArray")
            .field("name", &self.name())
            .field("scalar_type", &self.scalar_type())
            .field("num_tuples", &self.num_tuples())
            .field("num_components", &self.num_components())
            .finish()
    }
}

/// 带类型数据数组
///
/// [`DataArray`] 的具体实现，底层为连续 `Vec<T>`。
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArray<T: Scalar> {
    name: String,
    num_components: usize,
    data: Vec<T>,
}

impl<T: Scalar> TypedArray<T> {
    /// 创建零填充数组
    pub fn new(name: impl Into<String>, num_tuples: usize, num_components: usize) -> Self {
        let num_components = num_components.max(1);
        Self {
            name: name.into(),
            num_components,
            data: vec![T::default(); num_tuples * num_components],
        }
    }

    /// 从既有数据创建
    ///
    /// 数据长度必须能被分量数整除。
    pub fn from_vec(
        name: impl Into<String>,
        num_components: usize,
        data: Vec<T>,
    ) -> MvResult<Self> {
        let name = name.into();
        let num_components = num_components.max(1);
        if data.len() % num_components != 0 {
            return Err(MvError::size_mismatch(
                &name,
                (data.len() / num_components + 1) * num_components,
                data.len(),
            ));
        }
        Ok(Self {
            name,
            num_components,
            data,
        })
    }

    /// 读取分量
    pub fn get(&self, tuple: usize, component: usize) -> MvResult<T> {
        MvError::check_index("Tuple", tuple, self.num_tuples())?;
        MvError::check_index("Component", component, self.num_components)?;
        Ok(self.data[tuple * self.num_components + component])
    }

    /// 写入分量
    pub fn set(&mut self, tuple: usize, component: usize, value: T) -> MvResult<()> {
        MvError::check_index("Tuple", tuple, self.num_tuples())?;
        MvError::check_index("Component", component, self.num_components)?;
        self.data[tuple * self.num_components + component] = value;
        Ok(())
    }

    /// 查看一个元组的分量块
    pub fn tuple(&self, tuple: usize) -> MvResult<&[T]> {
        MvError::check_index("Tuple", tuple, self.num_tuples())?;
        let start = tuple * self.num_components;
        Ok(&self.data[start..start + self.num_components])
    }

    /// 整体切片
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// 整体切片（可变）
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 整体填充
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: Scalar> DataArray for TypedArray<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn scalar_type(&self) -> ScalarType {
        T::SCALAR_TYPE
    }

    fn num_tuples(&self) -> usize {
        self.data.len() / self.num_components
    }

    fn num_components(&self) -> usize {
        self.num_components
    }

    fn resize_tuples(&mut self, num_tuples: usize) {
        self.data.resize(num_tuples * self.num_components, T::default());
    }

    fn fill_zero(&mut self) {
        self.data.fill(T::default());
    }

    fn create_compatible(&self, num_tuples: usize) -> Box<dyn DataArray> {
        Box::new(Self::new(self.name.clone(), num_tuples, self.num_components))
    }

    fn clone_boxed(&self) -> Box<dyn DataArray> {
        Box::new(self.clone())
    }

    fn copy_tuple(
        &mut self,
        dst_tuple: usize,
        src: &dyn DataArray,
        src_tuple: usize,
    ) -> MvResult<()> {
        let other = src.as_any().downcast_ref::<Self>().ok_or_else(|| {
            MvError::type_mismatch(
                src.name(),
                format!("{} x{}", T::SCALAR_TYPE, self.num_components),
                format!("{} x{}", src.scalar_type(), src.num_components()),
            )
        })?;
        if other.num_components != self.num_components {
            return Err(MvError::type_mismatch(
                src.name(),
                format!("{} x{}", T::SCALAR_TYPE, self.num_components),
                format!("{} x{}", other.scalar_type(), other.num_components),
            ));
        }
        MvError::check_index("Tuple", dst_tuple, self.num_tuples())?;
        MvError::check_index("Tuple", src_tuple, other.num_tuples())?;

        let n = self.num_components;
        let dst_start = dst_tuple * n;
        let src_start = src_tuple * n;
        self.data[dst_start..dst_start + n]
            .copy_from_slice(&other.data[src_start..src_start + n]);
        Ok(())
    }

    fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    fn copy_from_bytes(&mut self, bytes: &[u8]) -> MvResult<()> {
        let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut self.data);
        MvError::check_size(&self.name, dst.len(), bytes.len())?;
        dst.copy_from_slice(bytes);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 按类型标签构造零填充数组
///
/// 存储后端按元数据重建数组时使用。
pub fn make_array(
    name: impl Into<String>,
    scalar_type: ScalarType,
    num_tuples: usize,
    num_components: usize,
) -> Box<dyn DataArray> {
    let name = name.into();
    match scalar_type {
        ScalarType::U8 => Box::new(TypedArray::<u8>::new(name, num_tuples, num_components)),
        ScalarType::I8 => Box::new(TypedArray::<i8>::new(name, num_tuples, num_components)),
        ScalarType::U16 => Box::new(TypedArray::<u16>::new(name, num_tuples, num_components)),
        ScalarType::I16 => Box::new(TypedArray::<i16>::new(name, num_tuples, num_components)),
        ScalarType::U32 => Box::new(TypedArray::<u32>::new(name, num_tuples, num_components)),
        ScalarType::I32 => Box::new(TypedArray::<i32>::new(name, num_tuples, num_components)),
        ScalarType::U64 => Box::new(TypedArray::<u64>::new(name, num_tuples, num_components)),
        ScalarType::I64 => Box::new(TypedArray::<i64>::new(name, num_tuples, num_components)),
        ScalarType::F32 => Box::new(TypedArray::<f32>::new(name, num_tuples, num_components)),
        ScalarType::F64 => Box::new(TypedArray::<f64>::new(name, num_tuples, num_components)),
    }
}

/// 对类型擦除数组做具体类型的只读访问
pub fn downcast_array<T: Scalar>(array: &dyn DataArray) -> MvResult<&TypedArray<T>> {
    array.as_any().downcast_ref::<TypedArray<T>>().ok_or_else(|| {
        MvError::type_mismatch(
            array.name(),
            T::SCALAR_TYPE.name(),
            array.scalar_type().name(),
        )
    })
}

/// 对类型擦除数组做具体类型的可变访问
pub fn downcast_array_mut<T: Scalar>(array: &mut dyn DataArray) -> MvResult<&mut TypedArray<T>> {
    let scalar_type = array.scalar_type();
    let name = array.name().to_string();
    array
        .as_any_mut()
        .downcast_mut::<TypedArray<T>>()
        .ok_or_else(|| MvError::type_mismatch(name, T::SCALAR_TYPE.name(), scalar_type.name()))
}

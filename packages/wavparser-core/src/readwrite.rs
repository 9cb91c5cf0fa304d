use std::{
    fmt::Debug,
    io::{self, Read, Seek, Write},
};

/// * The `Reader` trait, `Read + Seek + Debug`
pub trait Reader: Read + Seek + Debug {}
impl<T> Reader for T where T: Read + Seek + Debug {}

/// * Little-endian scalar IO, the only byte order a RIFF file uses.
pub trait LeIO: Sized + Copy {
    fn read_le<T>(r: &mut T) -> io::Result<Self>
    where
        T: Read + ?Sized;
    fn write_le<T>(&self, w: &mut T) -> io::Result<()>
    where
        T: Write + ?Sized;
    fn from_le_slice(buf: &[u8]) -> Self;
}

macro_rules! impl_le_io {
    ($($t:ty),+) => {
        $(
            impl LeIO for $t {
                #[inline(always)]
                fn read_le<T>(r: &mut T) -> io::Result<Self>
                where
                    T: Read + ?Sized,
                {
                    let mut buf = [0u8; size_of::<Self>()];
                    r.read_exact(&mut buf)?;
                    Ok(Self::from_le_bytes(buf))
                }

                #[inline(always)]
                fn write_le<T>(&self, w: &mut T) -> io::Result<()>
                where
                    T: Write + ?Sized,
                {
                    w.write_all(&self.to_le_bytes())
                }

                /// * The caller guarantees `buf` holds at least `size_of::<Self>()` bytes.
                #[inline(always)]
                fn from_le_slice(buf: &[u8]) -> Self {
                    let mut bytes = [0u8; size_of::<Self>()];
                    bytes.copy_from_slice(&buf[..size_of::<Self>()]);
                    Self::from_le_bytes(bytes)
                }
            }
        )+
    };
}

impl_le_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// * Read a 4-byte chunk flag.
pub fn read_flag<T>(r: &mut T) -> io::Result<[u8; 4]>
where
    T: Read + ?Sized,
{
    let mut flag = [0u8; 4];
    r.read_exact(&mut flag)?;
    Ok(flag)
}

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

use crate::config::{SourceConfig, SourceKind};
use crate::error::Error;

/// Largest value a 12-bit converter can report.
pub const ADC_MAX: u32 = 4095;

/// Synchronous "read one sample" primitive. Must not fail or block for long.
pub trait AnalogSource {
    fn read_sample(&mut self) -> u32;
    fn describe(&self) -> String;
}

impl AnalogSource for Box<dyn AnalogSource + Send> {
    fn read_sample(&mut self) -> u32 {
        (**self).read_sample()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Open the source selected by the configuration.
pub fn open(config: &SourceConfig) -> Result<Box<dyn AnalogSource + Send>, Error> {
    match config.kind {
        SourceKind::Simulated => Ok(Box::new(SimulatedAdc::new(
            config.midpoint,
            config.noise,
            config.seed,
        ))),
        SourceKind::Iio => Ok(Box::new(IioAdc::open(&config.iio_path)?)),
    }
}

/// A potentiometer wiper held at `midpoint`, with triangular noise of
/// +/- `noise` counts, clamped to the 12-bit range.
pub struct SimulatedAdc {
    rng: ChaCha20Rng,
    midpoint: u32,
    noise: u32,
}

impl SimulatedAdc {
    pub fn new(midpoint: u32, noise: u32, seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            midpoint: midpoint.min(ADC_MAX),
            noise,
        }
    }
}

impl AnalogSource for SimulatedAdc {
    fn read_sample(&mut self) -> u32 {
        if self.noise == 0 {
            return self.midpoint;
        }
        // Sum of two uniforms on [0, noise] gives a triangle on [0, 2*noise].
        let width = self.noise as u64 + 1;
        let a = self.rng.next_u64() % width;
        let b = self.rng.next_u64() % width;
        let offset = (a + b) as i64 - self.noise as i64;
        (self.midpoint as i64 + offset).clamp(0, ADC_MAX as i64) as u32
    }

    fn describe(&self) -> String {
        format!("simulated ADC (midpoint {}, noise +/-{})", self.midpoint, self.noise)
    }
}

/// Linux IIO raw channel, e.g. `/sys/bus/iio/devices/iio:device0/in_voltage0_raw`.
pub struct IioAdc {
    file: File,
    path: PathBuf,
    last: u32,
    buf: String,
}

impl IioAdc {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)
            .map_err(|e| Error::Source(format!("{} not available: {}", path.display(), e)))?;
        let mut adc = Self {
            file,
            path: path.to_path_buf(),
            last: 0,
            buf: String::with_capacity(16),
        };
        adc.last = adc.read_raw()?;
        Ok(adc)
    }

    fn read_raw(&mut self) -> Result<u32, Error> {
        // sysfs attributes must be re-read from offset 0 for a fresh conversion
        self.file.seek(SeekFrom::Start(0))?;
        self.buf.clear();
        self.file.read_to_string(&mut self.buf)?;
        self.buf.trim().parse::<u32>().map_err(|e| {
            Error::Source(format!(
                "unexpected value {:?} in {}: {}",
                self.buf.trim(),
                self.path.display(),
                e
            ))
        })
    }
}

impl AnalogSource for IioAdc {
    fn read_sample(&mut self) -> u32 {
        match self.read_raw() {
            Ok(v) => {
                self.last = v;
                v
            }
            Err(e) => {
                log::warn!(target: "adcjitter::trigger", "{}; repeating last sample", e);
                self.last
            }
        }
    }

    fn describe(&self) -> String {
        format!("IIO channel ({})", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simulated_is_deterministic() {
        let mut a = SimulatedAdc::new(2048, 8, 7);
        let mut b = SimulatedAdc::new(2048, 8, 7);
        for _ in 0..100 {
            assert_eq!(a.read_sample(), b.read_sample());
        }
    }

    #[test]
    fn test_simulated_stays_within_noise_band() {
        let mut adc = SimulatedAdc::new(1000, 5, 1);
        for _ in 0..1000 {
            let v = adc.read_sample();
            assert!((995..=1005).contains(&v), "sample {} out of band", v);
        }
    }

    #[test]
    fn test_simulated_clamps_to_adc_range() {
        let mut low = SimulatedAdc::new(0, 50, 3);
        let mut high = SimulatedAdc::new(ADC_MAX, 50, 3);
        for _ in 0..500 {
            assert!(low.read_sample() <= 50);
            assert!(high.read_sample() <= ADC_MAX);
        }
    }

    #[test]
    fn test_simulated_zero_noise_is_constant() {
        let mut adc = SimulatedAdc::new(1234, 0, 9);
        for _ in 0..10 {
            assert_eq!(adc.read_sample(), 1234);
        }
    }

    #[test]
    fn test_iio_reads_and_rereads() {
        let path = std::env::temp_dir().join("adcjitter_test_in_voltage0_raw");
        std::fs::write(&path, "1717\n").unwrap();
        let mut adc = IioAdc::open(&path).unwrap();
        assert_eq!(adc.read_sample(), 1717);

        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "42\n").unwrap();
        drop(f);
        assert_eq!(adc.read_sample(), 42);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_iio_bad_value_repeats_last() {
        let path = std::env::temp_dir().join("adcjitter_test_in_voltage1_raw");
        std::fs::write(&path, "300").unwrap();
        let mut adc = IioAdc::open(&path).unwrap();
        std::fs::write(&path, "garbage").unwrap();
        assert_eq!(adc.read_sample(), 300);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_iio_missing_file_errors() {
        let result = IioAdc::open(Path::new("/tmp/adcjitter_no_such_channel_raw"));
        assert!(matches!(result, Err(Error::Source(_))));
    }
}

//! [`Storage`] on top of an `embedded-sdmmc` FAT volume.
//!
//! Mounting opens volume 0 and its root directory; the log file lives there.
//! The card may be swapped while unmounted, so every mount re-initialises it
//! and starts a fresh `VolumeManager`.

use core::fmt::Debug;
use core::mem;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;
use embedded_sdmmc::{
    BlockDevice, Error, Mode, RawDirectory, RawFile, RawVolume, SdCard, TimeSource, VolumeIdx,
    VolumeManager,
};

use crate::mount::Storage;

/// SPI link whose clock is lowered while a card initialises.
pub trait SpiClock {
    /// 400 kHz or less, as SD initialisation requires.
    fn init_speed(&mut self);
    fn data_speed(&mut self);
}

/// Block device in a removable slot.
pub trait CardSlot: BlockDevice {
    /// Forgets whatever card was seen before and initialises the one
    /// present now.
    fn reacquire(&mut self) -> Result<(), Self::Error>;
}

impl<SPI, DELAYER> CardSlot for SdCard<SPI, DELAYER>
where
    SPI: SpiDevice<u8> + SpiClock,
    DELAYER: DelayNs,
{
    fn reacquire(&mut self) -> Result<(), Self::Error> {
        self.mark_card_uninit();
        self.spi(|spi| spi.init_speed());
        // Any card access runs the init sequence.
        self.num_bytes()?;
        self.spi(|spi| spi.data_speed());
        Ok(())
    }
}

enum Slot<D, T>
where
    D: BlockDevice,
    D::Error: Debug,
    T: TimeSource,
{
    Idle(D, T),
    Mounted {
        volume_mgr: VolumeManager<D, T>,
        volume: RawVolume,
        root: RawDirectory,
    },
    /// Only seen mid-transition.
    Busy,
}

pub struct SdStorage<D, T>
where
    D: CardSlot,
    D::Error: Debug,
    T: TimeSource,
{
    slot: Slot<D, T>,
}

impl<D, T> SdStorage<D, T>
where
    D: CardSlot,
    D::Error: Debug,
    T: TimeSource,
{
    pub fn new(block_device: D, time_source: T) -> Self {
        Self {
            slot: Slot::Idle(block_device, time_source),
        }
    }

    fn root(&self) -> Result<(&VolumeManager<D, T>, RawDirectory), Error<D::Error>> {
        match &self.slot {
            Slot::Mounted {
                volume_mgr, root, ..
            } => Ok((volume_mgr, *root)),
            _ => Err(Error::BadHandle),
        }
    }
}

fn open_root<D, T>(
    volume_mgr: &VolumeManager<D, T>,
) -> Result<(RawVolume, RawDirectory), Error<D::Error>>
where
    D: BlockDevice,
    D::Error: Debug,
    T: TimeSource,
{
    let volume = volume_mgr.open_raw_volume(VolumeIdx(0))?;
    match volume_mgr.open_root_dir(volume) {
        Ok(root) => Ok((volume, root)),
        Err(e) => {
            let _ = volume_mgr.close_volume(volume);
            Err(e)
        }
    }
}

impl<D, T> Storage for SdStorage<D, T>
where
    D: CardSlot,
    D::Error: Debug,
    T: TimeSource,
{
    type Error = Error<D::Error>;
    type File = RawFile;

    fn mount(&mut self) -> Result<(), Self::Error> {
        let (mut device, time_source) = match mem::replace(&mut self.slot, Slot::Busy) {
            Slot::Idle(device, time_source) => (device, time_source),
            Slot::Busy => return Err(Error::BadHandle),
            mounted => {
                self.slot = mounted;
                return Ok(());
            }
        };

        if let Err(e) = device.reacquire() {
            self.slot = Slot::Idle(device, time_source);
            return Err(Error::DeviceError(e));
        }

        let volume_mgr = VolumeManager::new(device, time_source);
        match open_root(&volume_mgr) {
            Ok((volume, root)) => {
                self.slot = Slot::Mounted {
                    volume_mgr,
                    volume,
                    root,
                };
                Ok(())
            }
            Err(e) => {
                let (device, time_source) = volume_mgr.free();
                self.slot = Slot::Idle(device, time_source);
                Err(e)
            }
        }
    }

    fn unmount(&mut self) -> Result<(), Self::Error> {
        match mem::replace(&mut self.slot, Slot::Busy) {
            Slot::Mounted {
                volume_mgr,
                volume,
                root,
            } => {
                if let Err(e) = volume_mgr.close_dir(root) {
                    self.slot = Slot::Mounted {
                        volume_mgr,
                        volume,
                        root,
                    };
                    return Err(e);
                }
                let closed = volume_mgr.close_volume(volume);
                let (device, time_source) = volume_mgr.free();
                self.slot = Slot::Idle(device, time_source);
                closed
            }
            other => {
                self.slot = other;
                Ok(())
            }
        }
    }

    fn open_append(&mut self, name: &str) -> Result<RawFile, Self::Error> {
        let (volume_mgr, root) = self.root()?;
        volume_mgr.open_file_in_dir(root, name, Mode::ReadWriteCreateOrAppend)
    }

    fn size(&mut self, file: &RawFile) -> Result<u32, Self::Error> {
        let (volume_mgr, _) = self.root()?;
        volume_mgr.file_length(*file)
    }

    fn write(&mut self, file: &mut RawFile, data: &[u8]) -> Result<(), Self::Error> {
        let (volume_mgr, _) = self.root()?;
        volume_mgr.write(*file, data)
    }

    fn close(&mut self, file: RawFile) -> Result<(), Self::Error> {
        let (volume_mgr, _) = self.root()?;
        volume_mgr.close_file(file)
    }
}

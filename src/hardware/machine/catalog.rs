//! Every supported 286 and 386SX board.
//!
//! Firmware paths are relative to the ROM root and a model's id is the name
//! of its directory under `machines/`. Boards with a 128K BIOS map it at
//! 0xE0000 so that it ends at the top of the first megabyte.

use std::collections::HashMap;

use lazy_static::lazy_static;
use rayon::prelude::*;

use super::{is_available, AtBase, CpuFamily, MachineDescriptor, Quirk, SlotBinding as B};
use crate::config::SessionConfig;
use crate::hardware::peripheral::chipset::*;
use crate::hardware::peripheral::display::{
    GD5402_ONBOARD, OTI067_AMA932J, PARADISE_PVGA1A, PARADISE_WD90C11_MEGAPC,
};
use crate::hardware::peripheral::fdc_necupd765::FDC_AT;
use crate::hardware::peripheral::flash::SST_FLASH_29EE010;
use crate::hardware::peripheral::ide::IDE_ISA;
use crate::hardware::peripheral::kbc_at::*;
use crate::hardware::peripheral::super_io::{F82C710, FDC37C669};
use crate::hardware::rom::{RomImageSpec, RomSpec};

const BIOS_64K: u32 = 0xF0000;
const BIOS_128K: u32 = 0xE0000;

pub static MACHINES: &[MachineDescriptor] = &[
    MachineDescriptor {
        id: "mr286",
        name: "[ISA] MR 286 clone",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/mr286/V000B200-1",
            "machines/mr286/V000B200-2",
            BIOS_64K,
            32768,
            0,
        )),
        base: AtBase::CommonIde,
        devices: &[B::always(&KEYBOARD_AT), B::always(&FDC_AT)],
        quirks: &[],
    },
    MachineDescriptor {
        id: "tg286m",
        name: "[Headland GC103] TriGem 286M",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear("machines/tg286m/ami.bin", BIOS_128K, 131072, 0)),
        base: AtBase::CommonIde,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&HEADLAND_GC10X),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "ama932j",
        name: "[Headland HT18] AMA-932J",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear("machines/ama932j/ami.bin", BIOS_128K, 131072, 0)),
        base: AtBase::CommonIde,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&HEADLAND_HT18B),
            B::internal_video(&OTI067_AMA932J),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "quadt286",
        name: "[Headland GC10x] Quadtel 286 clone",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/quadt286/QUADT89L.ROM",
            "machines/quadt286/QUADT89H.ROM",
            BIOS_64K,
            32768,
            0,
        )),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT),
            B::always(&FDC_AT),
            B::always(&HEADLAND_GC10X),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "dtk386",
        name: "[NEAT] DTK 386SX clone",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::linear("machines/dtk386/3cto001.bin", BIOS_64K, 65536, 0)),
        base: AtBase::WithKeyboard,
        devices: &[B::always(&NEAT), B::always(&FDC_AT)],
        quirks: &[],
    },
    MachineDescriptor {
        id: "ami286",
        name: "[NEAT] AMI 286 clone",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear("machines/ami286/amic206.bin", BIOS_64K, 65536, 0)),
        base: AtBase::Common,
        devices: &[
            B::always(&NEAT),
            B::always(&FDC_AT),
            B::always(&KEYBOARD_AT_AMI),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "px286",
        name: "[NEAT] Phoenix 286 clone",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear("machines/px286/KENITEC.BIN", BIOS_64K, 65536, 0)),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT),
            B::always(&FDC_AT),
            B::always(&NEAT),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "micronics386",
        name: "[NEAT] Micronics 386 clone",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/micronics386/386-Micronics-09-00021-EVEN.BIN",
            "machines/micronics386/386-Micronics-09-00021-ODD.BIN",
            BIOS_128K,
            65536,
            0,
        )),
        base: AtBase::WithKeyboard,
        devices: &[B::always(&NEAT), B::always(&FDC_AT)],
        quirks: &[],
    },
    MachineDescriptor {
        id: "award286",
        name: "[SCAT] Award 286 clone",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear("machines/award286/award.bin", BIOS_128K, 131072, 0)),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&SCAT),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "gdc212m",
        name: "[SCAT] GoldStar GDC-212M",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear(
            "machines/gdc212m/gdc212m_72h.bin",
            BIOS_64K,
            65536,
            0,
        )),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&SCAT),
            B::always(&IDE_ISA),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "gw286ct",
        name: "[SCAT] GW-286CT GEAR",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear("machines/gw286ct/2ctc001.bin", BIOS_128K, 131072, 0)),
        base: AtBase::Common,
        devices: &[
            B::always(&F82C710),
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&SCAT_4),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "super286tr",
        name: "[SCAT] Hyundai Super-286TR",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear(
            "machines/super286tr/hyundai_award286.bin",
            BIOS_128K,
            131072,
            0,
        )),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&SCAT),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "spc4200p",
        name: "[SCAT] Samsung SPC-4200P",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear("machines/spc4200p/u8.01", BIOS_128K, 131072, 0)),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&SCAT),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "spc4216p",
        name: "[SCAT] Samsung SPC-4216P",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/spc4216p/7101.u8",
            "machines/spc4216p/ac64.u10",
            BIOS_128K,
            65536,
            0,
        )),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&SCAT_4),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "kmxc02",
        name: "[SCATsx] KMX-C-02",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::linear("machines/kmxc02/3ctm005.bin", BIOS_128K, 131072, 0)),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&SCAT_SX),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "deskmaster286",
        name: "[SCAT] Samsung Deskmaster 286",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear(
            "machines/deskmaster286/SAMSUNG-DESKMASTER-28612-ROM.BIN",
            BIOS_128K,
            131072,
            0,
        )),
        base: AtBase::Common,
        devices: &[
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
            B::always(&SCAT),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "shuttle386sx",
        name: "[Intel 82335] Shuttle 386SX",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/shuttle386sx/386-Shuttle386SX-Even.BIN",
            "machines/shuttle386sx/386-Shuttle386SX-Odd.BIN",
            BIOS_128K,
            65536,
            0,
        )),
        base: AtBase::Common,
        devices: &[
            B::always(&INTEL_82335),
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "adi386sx",
        name: "[Intel 82335] ADI 386SX",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/adi386sx/3iip001l.bin",
            "machines/adi386sx/3iip001h.bin",
            BIOS_64K,
            32768,
            0,
        )),
        base: AtBase::Common,
        devices: &[
            B::always(&INTEL_82335),
            B::always(&KEYBOARD_AT_AMI),
            B::always(&FDC_AT),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "megapc",
        name: "[WD76C10] Amstrad MegaPC",
        cpu: CpuFamily::I386Sx,
        // Only the upper half of each chip is the BIOS
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/megapc/41651-bios lo.u18",
            "machines/megapc/211253-bios hi.u19",
            BIOS_64K,
            32768,
            0x8000,
        )),
        base: AtBase::CommonIde,
        devices: &[
            B::always(&KEYBOARD_PS2_QUADTEL),
            B::always(&WD76C10),
            B::internal_video(&PARADISE_WD90C11_MEGAPC),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "cbm_sl386sx25",
        name: "[SCAMP] Commodore SL386SX-25",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/cbm_sl386sx25/cbm-sl386sx-bios-lo-v1.04-390914-04.bin",
            "machines/cbm_sl386sx25/cbm-sl386sx-bios-hi-v1.04-390915-04.bin",
            BIOS_64K,
            32768,
            0,
        )),
        base: AtBase::CommonIde,
        devices: &[
            B::always(&KEYBOARD_AT),
            B::always(&FDC_AT),
            B::always(&VLSI_SCAMP),
            B::internal_video(&GD5402_ONBOARD),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "awardsx",
        name: "[OPTi 291] Award 386SX clone",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::linear(
            "machines/awardsx/Unknown 386SX OPTi291 - Award (original).BIN",
            BIOS_64K,
            65536,
            0,
        )),
        base: AtBase::WithKeyboard,
        devices: &[B::always(&OPTI291), B::always(&FDC_AT)],
        quirks: &[],
    },
    MachineDescriptor {
        id: "arb1375",
        name: "[ALi M6117D] Acrosser AR-B1375",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::linear("machines/arb1375/a1375v25.u11-a", BIOS_128K, 131072, 0)),
        base: AtBase::Common,
        devices: &[
            B::always(&FDC37C669),
            B::always(&KEYBOARD_PS2_AMI_PCI),
            B::always(&ALI6117D),
            B::always(&SST_FLASH_29EE010),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "pja511m",
        name: "[ALi M6117D] Protech ProX-1332",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::linear(
            "machines/pja511m/2006915102435734.rom",
            BIOS_128K,
            131072,
            0,
        )),
        base: AtBase::Common,
        // Only the first of the two FDC37C669s is wired up
        devices: &[
            B::instance(&FDC37C669, 1),
            B::always(&KEYBOARD_PS2_AMI_PCI),
            B::always(&ALI6117D),
            B::always(&SST_FLASH_29EE010),
        ],
        quirks: &[],
    },
    MachineDescriptor {
        id: "olivetti_m290",
        name: "[ISA] Olivetti M290",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::linear(
            "machines/olivetti_m290/m290_pep3_1.25.bin",
            BIOS_64K,
            65536,
            0,
        )),
        base: AtBase::Common,
        devices: &[B::always(&KEYBOARD_AT), B::always(&FDC_AT)],
        quirks: &[Quirk::M290DipSwitches],
    },
    MachineDescriptor {
        id: "ncr_pc8",
        name: "[ISA] NCR PC8/810/710/3390/3392",
        cpu: CpuFamily::I286,
        roms: RomSpec::new(RomImageSpec::interleaved(
            "machines/ncr_pc8/ncr_35117_u127_vers.4-2.bin",
            "machines/ncr_pc8/ncr_35116_u113_vers.4-2.bin",
            BIOS_64K,
            32768,
            0,
        )),
        base: AtBase::Common,
        devices: &[B::always(&KEYBOARD_AT_NCR), B::always(&FDC_AT)],
        quirks: &[],
    },
    MachineDescriptor {
        id: "ncr_3302",
        name: "[NEAT] NCR 3302",
        cpu: CpuFamily::I286,
        roms: RomSpec::with_aux(
            RomImageSpec::linear("machines/ncr_3302/f000-flex_drive_test.bin", BIOS_64K, 65536, 0),
            RomImageSpec::linear(
                "machines/ncr_3302/f800-setup_ncr3.5-013190.bin",
                0xF8000,
                32768,
                0,
            ),
        ),
        base: AtBase::CommonIde,
        devices: &[
            B::always(&NEAT),
            B::always(&KEYBOARD_AT_NCR),
            B::always(&FDC_AT),
            B::internal_video(&PARADISE_PVGA1A),
        ],
        quirks: &[],
    },
];

lazy_static! {
    static ref BY_ID: HashMap<&'static str, &'static MachineDescriptor> =
        MACHINES.iter().map(|m| (m.id, m)).collect();
}

pub fn all() -> &'static [MachineDescriptor] {
    MACHINES
}

pub fn find(id: &str) -> Option<&'static MachineDescriptor> {
    BY_ID.get(id).copied()
}

/// Firmware availability of every model, in catalog order.
pub fn probe_all(config: &SessionConfig) -> Vec<(&'static MachineDescriptor, bool)> {
    MACHINES
        .par_iter()
        .map(|m| (m, is_available(m, config)))
        .collect()
}

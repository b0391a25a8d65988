mod common;

use assert_hex::assert_eq_hex;
use common::RomDir;
use ibm_at::config::ConfigError;
use ibm_at::hardware::device::{Device, DeviceDescriptor, DeviceSlot, FaultCause};
use ibm_at::hardware::io::PortHandlers;
use ibm_at::hardware::machine::{init, AtBase, CpuFamily, Quirk, SlotBinding};
use ibm_at::hardware::peripheral::display::{external_card, MDA, VGA};
use ibm_at::hardware::rom::{RomImageSpec, RomSpec};
use ibm_at::{
    catalog, compose, DisplayAdapter, GfxCard, MachineDescriptor, MachineError, Session,
    SessionConfig,
};

// Two cards fighting over the mono ports
static CLASHING_VIDEO: MachineDescriptor = MachineDescriptor {
    id: "clashing_video",
    name: "Board with two video cards",
    cpu: CpuFamily::I286,
    roms: RomSpec::new(RomImageSpec::linear(
        "machines/clashing_video/bios.bin",
        0xF0000,
        65536,
        0,
    )),
    base: AtBase::WithKeyboard,
    devices: &[SlotBinding::always(&MDA), SlotBinding::always(&VGA)],
    quirks: &[],
};

fn machine(id: &str) -> &'static MachineDescriptor {
    catalog::find(id).unwrap()
}

fn device_names(session: &Session) -> Vec<&'static str> {
    session.devices.instances().map(|i| i.name).collect()
}

#[test]
fn check_only_maps_firmware_and_nothing_else() {
    let dir = RomDir::new("check_only");
    let m290 = machine("olivetti_m290");
    let files = dir.install_image(&m290.roms.primary);

    let mut session = compose(m290, dir.config().check_only()).unwrap();
    assert!(session.devices.is_empty());
    assert!(session.io().is_empty());
    assert_eq!(session.memory().slice(0xF0000, 0x10000).unwrap(), &files[0][..]);

    // Running the check again gives the same result
    init(&mut session, m290).unwrap();
    assert_eq!(session.machine().map(|m| m.id), Some("olivetti_m290"));
    assert!(session.devices.is_empty());
    assert!(session.io().is_empty());
    assert_eq!(session.memory().slice(0xF0000, 0x10000).unwrap(), &files[0][..]);
}

#[test]
fn missing_bios_leaves_session_empty() {
    let dir = RomDir::new("no_bios");
    let mr286 = machine("mr286");

    let err = compose(mr286, dir.config()).err().unwrap();
    assert!(matches!(
        err,
        MachineError::RomUnavailable {
            machine: "mr286",
            ..
        }
    ));

    // Same through a session that was running another board
    let m290 = machine("olivetti_m290");
    dir.install(m290);
    let mut session = compose(m290, dir.config()).unwrap();
    assert!(!session.devices.is_empty());

    assert!(init(&mut session, mr286).is_err());
    assert!(session.machine().is_none());
    assert!(session.devices.is_empty());
    assert!(session.io().is_empty());
    assert!(session.memory().slice(0xF0000, 0x10000).unwrap().iter().all(|&b| b == 0));
}

#[test]
fn m290_dip_switches_report_display_class() {
    let dir = RomDir::new("m290");
    let m290 = machine("olivetti_m290");
    dir.install(m290);

    let cases = [
        (GfxCard::External(DisplayAdapter::Cga), 0x0F),
        (GfxCard::External(DisplayAdapter::Mda), 0x03),
        (GfxCard::External(DisplayAdapter::Vga), 0x03),
        (GfxCard::None, 0x03),
        (GfxCard::Internal, 0x03),
    ];

    for (gfx, expected) in cases {
        let session = compose(m290, dir.config().set_gfx_card(gfx)).unwrap();
        assert_eq_hex!(session.io().read8(0x69), expected);
        assert_eq!(session.io().label_at(0x69), Some("m290 dip switches"));
    }
}

#[test]
fn dip_switch_port_only_on_m290() {
    let dir = RomDir::new("no_dip");
    let ncr = machine("ncr_pc8");
    dir.install(ncr);

    let session = compose(ncr, dir.config()).unwrap();
    assert!(!session.io().is_bound(0x69));
    assert_eq_hex!(session.io().read8(0x69), 0xFF);
}

#[test]
fn every_model_composes() {
    let dir = RomDir::new("catalog");
    for m in catalog::all() {
        dir.install(m);
    }

    let cards = [
        GfxCard::Internal,
        GfxCard::External(DisplayAdapter::Cga),
        GfxCard::External(DisplayAdapter::Vga),
        GfxCard::None,
    ];

    for m in catalog::all() {
        for gfx in cards {
            let config = dir.config().set_gfx_card(gfx);
            let plan = m.device_plan(&config);
            let session = match compose(m, config) {
                Ok(session) => session,
                Err(e) => panic!("{} with {gfx:?}: {e}", m.id),
            };

            assert_eq!(session.devices.len(), plan.len(), "{}", m.id);
            assert_eq!(device_names(&session)[0], "at_core");

            let display = session.platform.display.get();
            match gfx {
                GfxCard::External(adapter) => {
                    assert_eq!(display, Some(adapter));
                    let last = device_names(&session).pop();
                    assert_eq!(last, Some(external_card(adapter).internal_name));
                }
                GfxCard::Internal if m.internal_video().is_some() => {
                    assert_eq!(display, Some(DisplayAdapter::Vga), "{}", m.id);
                }
                _ => assert_eq!(display, None, "{}", m.id),
            }
        }
    }
}

#[test]
fn onboard_video_depends_on_configuration() {
    let dir = RomDir::new("onboard");
    let ama = machine("ama932j");
    dir.install(ama);

    assert_eq!(
        ama.internal_video().map(|d| d.internal_name),
        Some("oti067_ama932j")
    );
    assert!(machine("olivetti_m290").internal_video().is_none());

    let session = compose(ama, dir.config()).unwrap();
    assert!(session.devices.contains("oti067_ama932j"));
    drop(session);

    let session = compose(ama, dir.config().set_gfx_card(GfxCard::None)).unwrap();
    assert!(!session.devices.contains("oti067_ama932j"));
    assert!(!session.io().is_bound(0x3D4));
    drop(session);

    let session = compose(
        ama,
        dir.config()
            .set_gfx_card(GfxCard::External(DisplayAdapter::Cga)),
    )
    .unwrap();
    assert!(!session.devices.contains("oti067_ama932j"));
    assert!(session.devices.contains("cga"));
}

#[test]
fn devices_are_added_in_stage_order() {
    let dir = RomDir::new("stages");
    let gw = machine("gw286ct");
    dir.install(gw);

    let expected = ["at_core", "scat_4", "f82c710", "keyboard_at_ami", "fdc_at"];
    let plan: Vec<_> = gw
        .device_plan(&SessionConfig::default())
        .iter()
        .map(|p| p.device.internal_name)
        .collect();
    assert_eq!(plan, expected);

    let session = compose(gw, dir.config()).unwrap();
    assert_eq!(device_names(&session), expected);
}

#[test]
fn external_card_comes_last() {
    let config = SessionConfig::default().set_gfx_card(GfxCard::External(DisplayAdapter::Hercules));
    let plan = machine("ncr_3302").device_plan(&config);

    assert_eq!(plan.last().map(|p| p.device.internal_name), Some("hercules"));
    assert!(plan.iter().all(|p| p.device.internal_name != "paradise_pvga1a"));
}

#[test]
fn second_super_io_is_an_indexed_instance() {
    let dir = RomDir::new("pja511m");
    let pja = machine("pja511m");
    dir.install(pja);

    let session = compose(pja, dir.config()).unwrap();
    let fdc = session
        .devices
        .instances()
        .find(|i| i.name == "fdc37c669")
        .unwrap();
    assert_eq!(fdc.index, 1);
    assert!(session.io().is_bound(0x3F0));
    assert_eq!(session.memory().owner_of(0xE0000), Some("sst_flash_29ee010"));
}

#[test]
fn aux_rom_overlays_setup_region() {
    let dir = RomDir::new("ncr_3302");
    let ncr = machine("ncr_3302");
    let primary = dir.install_image(&ncr.roms.primary);
    let aux = dir.install_image(&ncr.roms.aux.unwrap());

    let session = compose(ncr, dir.config().check_only()).unwrap();
    assert_eq!(session.memory().slice(0xF0000, 0x8000).unwrap(), &primary[0][..0x8000]);
    assert_eq!(session.memory().slice(0xF8000, 0x8000).unwrap(), &aux[0][..]);
}

#[test]
fn missing_aux_rom_is_not_fatal() {
    let dir = RomDir::new("ncr_3302_noaux");
    let ncr = machine("ncr_3302");
    let primary = dir.install_image(&ncr.roms.primary);

    let session = compose(ncr, dir.config()).unwrap();
    assert_eq!(session.memory().slice(0xF0000, 0x10000).unwrap(), &primary[0][..]);
    assert!(session.devices.contains("neat"));
}

#[test]
fn reinit_switches_models() {
    let dir = RomDir::new("reinit");
    let mr286 = machine("mr286");
    let m290 = machine("olivetti_m290");
    dir.install(mr286);
    dir.install(m290);

    let mut session = compose(mr286, dir.config()).unwrap();
    assert!(session.devices.contains("ide_isa"));
    assert!(!session.io().is_bound(0x69));

    init(&mut session, m290).unwrap();
    assert_eq!(session.machine().map(|m| m.id), Some("olivetti_m290"));
    assert!(!session.devices.contains("ide_isa"));
    assert!(!session.io().is_bound(0x1F0));
    assert!(session.io().is_bound(0x69));

    // And back, the machine's own port goes with it
    init(&mut session, mr286).unwrap();
    assert!(!session.io().is_bound(0x69));
    assert!(session.devices.contains("ide_isa"));
}

#[test]
fn device_fault_tears_everything_down() {
    let dir = RomDir::new("clash");
    dir.install(&CLASHING_VIDEO);

    let mut session = Session::new(dir.config());
    let err = init(&mut session, &CLASHING_VIDEO).unwrap_err();

    match err {
        MachineError::Device(fault) => {
            assert_eq!(fault.device, "vga");
            assert!(matches!(fault.cause, FaultCause::PortConflict(_)));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(session.machine().is_none());
    assert!(session.devices.is_empty());
    assert!(session.io().is_empty());
    assert_eq!(session.memory().region_count(), 0);
    assert_eq!(session.platform.display.get(), None);
}

struct Latch;

impl Device for Latch {}

// Sits on top of the M290 switch port
static PORT_68_LATCH: DeviceDescriptor = DeviceDescriptor {
    name: "Port 68h latch",
    internal_name: "port_68_latch",
    slot: DeviceSlot::Chipset,
    init: |ctx| {
        let name = ctx.name();
        ctx.claim_ports(0x68, 3, PortHandlers::new(name).on_read8(|_| 0x00))?;
        Ok(Box::new(Latch))
    },
};

static SWITCHES_OVER_LATCH: MachineDescriptor = MachineDescriptor {
    id: "switches_over_latch",
    name: "Board whose switch port is already taken",
    cpu: CpuFamily::I286,
    roms: RomSpec::new(RomImageSpec::linear(
        "machines/switches_over_latch/bios.bin",
        0xF0000,
        65536,
        0,
    )),
    base: AtBase::WithKeyboard,
    devices: &[SlotBinding::always(&PORT_68_LATCH)],
    quirks: &[Quirk::M290DipSwitches],
};

#[test]
fn quirk_port_conflict_tears_everything_down() {
    let dir = RomDir::new("switches_over_latch");
    dir.install(&SWITCHES_OVER_LATCH);

    let mut session = Session::new(dir.config());
    match init(&mut session, &SWITCHES_OVER_LATCH) {
        Err(MachineError::PortConflict(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(()) => panic!("switch port installed over a bound range"),
    }

    assert!(session.machine().is_none());
    assert!(session.devices.is_empty());
    assert!(session.io().is_empty());
    assert!(!session.io().is_bound(0x69));
    assert_eq!(session.memory().region_count(), 0);
}

#[test]
fn duplicate_device_in_table_is_a_fault() {
    static DOUBLE_KBC: MachineDescriptor = MachineDescriptor {
        id: "double_kbc",
        name: "Board listing its keyboard controller twice",
        cpu: CpuFamily::I386Sx,
        roms: RomSpec::new(RomImageSpec::linear(
            "machines/double_kbc/bios.bin",
            0xF0000,
            65536,
            0,
        )),
        base: AtBase::WithKeyboard,
        devices: &[SlotBinding::always(&ibm_at::hardware::peripheral::kbc_at::KEYBOARD_AT)],
        quirks: &[],
    };

    let dir = RomDir::new("double_kbc");
    dir.install(&DOUBLE_KBC);

    match compose(&DOUBLE_KBC, dir.config()) {
        Err(MachineError::Device(fault)) => {
            assert_eq!(fault.device, "keyboard_at");
            assert!(matches!(fault.cause, FaultCause::Duplicate));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("double keyboard controller accepted"),
    }
}

#[test]
fn probe_reports_installed_firmware() {
    let dir = RomDir::new("probe");
    dir.install(machine("megapc"));
    dir.install(machine("ncr_3302"));

    let results = catalog::probe_all(&dir.config());
    assert_eq!(results.len(), catalog::all().len());

    for ((m, available), expected) in results.iter().zip(catalog::all()) {
        assert_eq!(m.id, expected.id);
        assert_eq!(*available, matches!(m.id, "megapc" | "ncr_3302"), "{}", m.id);
    }
}

#[test]
fn catalog_ids_are_unique_and_findable() {
    let mut ids: Vec<_> = catalog::all().iter().map(|m| m.id).collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total);

    for m in catalog::all() {
        assert!(std::ptr::eq(catalog::find(m.id).unwrap(), m));
        assert!(m.roms.primary.files()[0].starts_with(&format!("machines/{}/", m.id)));
    }
    assert!(catalog::find("ibm5150").is_none());
}

#[test]
fn config_from_json() {
    let config = SessionConfig::from_json_str(r#"{"gfx_card":{"external":"cga"}}"#).unwrap();
    assert_eq!(config.gfx_card, GfxCard::External(DisplayAdapter::Cga));
    assert!(!config.check_only);

    let config =
        SessionConfig::from_json_str(r#"{"rom_path":"/opt/roms","check_only":true,"gfx_card":"none"}"#)
            .unwrap();
    assert_eq!(config.gfx_card, GfxCard::None);
    assert!(config.check_only);
    assert_eq!(config.rom_path, std::path::PathBuf::from("/opt/roms"));

    assert_eq!(SessionConfig::from_json_str("{}").unwrap(), SessionConfig::default());
    assert!(matches!(
        SessionConfig::from_json_str(r#"{"gfx_card":"tandy"}"#),
        Err(ConfigError::Parse(_))
    ));
}

use assert_hex::assert_eq_hex;
use ibm_at::hardware::device::{Device, DeviceDescriptor, DeviceRegistry};
use ibm_at::hardware::peripheral::at_core::AT_CORE;
use ibm_at::hardware::peripheral::chipset::{NEAT, OPTI291, VLSI_SCAMP, WD76C10};
use ibm_at::hardware::peripheral::display::{
    ActiveDisplay, DisplayAdapter, VideoCard, VideoDevice, CGA, MDA,
};
use ibm_at::hardware::peripheral::dma_8237::DMA8237;
use ibm_at::hardware::peripheral::fdc_necupd765::{FloppyDiskController, FDC_AT, FDC_PRIMARY};
use ibm_at::hardware::peripheral::flash::{Sst29ee010, SST_FLASH_29EE010};
use ibm_at::hardware::peripheral::ide::IDE_ISA;
use ibm_at::hardware::peripheral::kbc_at::{
    KbcVariant, KeyboardController, KEYBOARD_AT, KEYBOARD_AT_AMI, KEYBOARD_PS2_QUADTEL,
};
use ibm_at::hardware::peripheral::super_io::{F82C710, FDC37C669};
use ibm_at::hardware::peripheral::{shared, Peripheral};
use ibm_at::hardware::sys::Platform;
use ibm_at::SessionConfig;

struct Bench {
    platform: Platform,
    config: SessionConfig,
    devices: DeviceRegistry,
}

impl Bench {
    fn with(descriptors: &[&'static DeviceDescriptor]) -> Self {
        let mut bench = Bench {
            platform: Platform::new(),
            config: SessionConfig::default(),
            devices: DeviceRegistry::new(),
        };
        for descriptor in descriptors {
            bench
                .devices
                .add(&mut bench.platform, &bench.config, descriptor)
                .unwrap();
        }
        bench
    }

    fn inb(&self, port: u16) -> u8 {
        self.platform.io.read8(port)
    }

    fn outb(&self, port: u16, val: u8) {
        self.platform.io.write8(port, val)
    }
}

#[test]
fn kbc_self_test_and_command_byte() {
    let bench = Bench::with(&[&KEYBOARD_AT]);

    bench.outb(0x64, 0xAA);
    assert_eq_hex!(bench.inb(0x64) & 0x01, 0x01);
    assert_eq_hex!(bench.inb(0x60), 0x55);
    assert_eq_hex!(bench.inb(0x64) & 0x05, 0x04);

    bench.outb(0x64, 0x60);
    bench.outb(0x60, 0x45);
    bench.outb(0x64, 0x20);
    assert_eq_hex!(bench.inb(0x60), 0x45);

    // Keyboard reset is acknowledged, then passes its self test
    bench.outb(0x60, 0xFF);
    assert_eq_hex!(bench.inb(0x60), 0xFA);
    assert_eq_hex!(bench.inb(0x60), 0xAA);
    assert_eq_hex!(bench.inb(0x64) & 0x01, 0x00);
}

#[test]
fn kbc_variants_differ_in_version_and_aux() {
    let ami = Bench::with(&[&KEYBOARD_AT_AMI]);
    ami.outb(0x64, 0xA1);
    assert_eq!(ami.inb(0x60), b'F');

    let ps2 = Bench::with(&[&KEYBOARD_PS2_QUADTEL]);
    ps2.outb(0x64, 0xA9);
    assert_eq_hex!(ps2.inb(0x64) & 0x01, 0x01);
    assert_eq_hex!(ps2.inb(0x60), 0x00);

    // Plain AT controllers ignore aux port commands
    let at = Bench::with(&[&KEYBOARD_AT]);
    at.outb(0x64, 0xA9);
    assert_eq_hex!(at.inb(0x64) & 0x01, 0x00);
}

#[test]
fn kbc_output_port_drives_a20() {
    let bench = Bench::with(&[&KEYBOARD_AT]);

    bench.outb(0x64, 0xD1);
    bench.outb(0x60, 0xDD);
    bench.outb(0x64, 0xD0);
    assert_eq_hex!(bench.inb(0x60), 0xDD);

    let mut kbc = KeyboardController::new(KbcVariant::Ibm);
    kbc.port_out(0xD1, 0x64);
    kbc.port_out(0xDD, 0x60);
    assert!(!kbc.a20_enabled());
    kbc.port_out(0xD1, 0x64);
    kbc.port_out(0xDF, 0x60);
    assert!(kbc.a20_enabled());
}

#[test]
fn kbc_output_queue_is_bounded() {
    let mut kbc = KeyboardController::new(KbcVariant::Ibm);

    // Nobody drains port 0x60 while the keyboard keeps acknowledging
    for _ in 0..1000 {
        kbc.port_out(0xF4, 0x60);
    }

    let mut queued = 0;
    while kbc.port_in(0x64) & 0x01 != 0 {
        assert_eq_hex!(kbc.port_in(0x60), 0xFA);
        queued += 1;
        assert!(queued <= 16);
    }
    assert!(queued > 0);

    // Once drained it answers again
    kbc.port_out(0xAA, 0x64);
    assert_eq_hex!(kbc.port_in(0x60), 0x55);
}

#[test]
fn nvr_keeps_written_values() {
    let bench = Bench::with(&[&AT_CORE]);

    bench.outb(0x70, 0x10);
    bench.outb(0x71, 0x40);
    bench.outb(0x70, 0x8F);
    bench.outb(0x71, 0x5A);

    bench.outb(0x70, 0x10);
    assert_eq_hex!(bench.inb(0x71), 0x40);
    bench.outb(0x70, 0x0F);
    assert_eq_hex!(bench.inb(0x71), 0x5A);

    // Status register D always reports a good battery
    bench.outb(0x70, 0x0D);
    bench.outb(0x71, 0x00);
    assert_eq_hex!(bench.inb(0x71), 0x80);
}

#[test]
fn nvr_survives_soft_reset() {
    let mut bench = Bench::with(&[&AT_CORE]);

    bench.outb(0x70, 0x2E);
    bench.outb(0x71, 0x12);
    bench.devices.reset_all();

    bench.outb(0x70, 0x2E);
    assert_eq_hex!(bench.inb(0x71), 0x12);
}

#[test]
fn fdc_leaves_reset_with_pending_interrupts() {
    let bench = Bench::with(&[&FDC_AT]);

    assert_eq_hex!(bench.inb(0x3F4), 0x00);
    bench.outb(0x3F2, 0x0C);
    assert_eq_hex!(bench.inb(0x3F4), 0x80);

    for drive in 0..4 {
        bench.outb(0x3F5, 0x08);
        assert_eq_hex!(bench.inb(0x3F4), 0xD0);
        assert_eq_hex!(bench.inb(0x3F5), 0xC0 | drive);
        assert_eq_hex!(bench.inb(0x3F5), 0x00);
        assert_eq_hex!(bench.inb(0x3F4), 0x80);
    }

    // Nothing left to sense
    bench.outb(0x3F5, 0x08);
    assert_eq_hex!(bench.inb(0x3F5), 0x80);
}

#[test]
fn fdc_seek_and_version() {
    let bench = Bench::with(&[&FDC_AT]);
    bench.outb(0x3F2, 0x1C);
    for _ in 0..4 {
        bench.outb(0x3F5, 0x08);
        bench.inb(0x3F5);
        bench.inb(0x3F5);
    }

    bench.outb(0x3F5, 0x0F);
    assert_eq_hex!(bench.inb(0x3F4), 0x90);
    bench.outb(0x3F5, 0x00);
    bench.outb(0x3F5, 0x27);
    assert_eq_hex!(bench.inb(0x3F4), 0x80);

    bench.outb(0x3F5, 0x08);
    assert_eq_hex!(bench.inb(0x3F5), 0x20);
    assert_eq_hex!(bench.inb(0x3F5), 0x27);

    bench.outb(0x3F5, 0x10);
    assert_eq_hex!(bench.inb(0x3F5), 0x80);
    assert_eq_hex!(bench.inb(0x3F7), 0x00);
}

#[test]
fn fdc_digital_output_register_fields() {
    let mut fdc = FloppyDiskController::new(FDC_PRIMARY);

    fdc.port_out(0x2D, 0x3F2);
    assert_eq!(fdc.get_selected_drive(), 1);
    assert!(fdc.is_dma_irq_mode());
    assert!(fdc.is_motor_started(1));
    assert!(!fdc.is_motor_started(0));
    assert_eq_hex!(fdc.port_in(0x3F2), 0x2D);

    fdc.port_out(0x84, 0x3F2);
    assert_eq!(fdc.get_selected_drive(), 0);
    assert!(!fdc.is_dma_irq_mode());
    assert!(fdc.is_motor_started(3));
}

#[test]
fn ide_aborts_without_drives() {
    let bench = Bench::with(&[&IDE_ISA]);

    bench.outb(0x1F7, 0xEC);
    assert_eq_hex!(bench.inb(0x1F7), 0x41);
    assert_eq_hex!(bench.inb(0x1F1), 0x04);
    assert_eq_hex!(bench.platform.io.read16(0x1F0), 0x0000);

    bench.outb(0x3F6, 0x04);
    assert_eq_hex!(bench.inb(0x3F6), 0x00);
    assert_eq_hex!(bench.inb(0x1F1), 0x00);
}

#[test]
fn indexed_chipsets_hold_their_registers() {
    let neat = Bench::with(&[&NEAT]);
    neat.outb(0x22, 0x6B);
    neat.outb(0x23, 0x3C);
    neat.outb(0x22, 0x60);
    assert_eq_hex!(neat.inb(0x23), 0x00);
    neat.outb(0x22, 0x6B);
    assert_eq_hex!(neat.inb(0x23), 0x3C);

    let opti = Bench::with(&[&OPTI291]);
    opti.outb(0x22, 0x21);
    opti.outb(0x24, 0x99);
    assert_eq_hex!(opti.inb(0x24), 0x99);
    assert!(!opti.platform.io.is_bound(0x23));

    let scamp = Bench::with(&[&VLSI_SCAMP]);
    scamp.outb(0xEC, 0x02);
    scamp.outb(0xED, 0x41);
    assert_eq_hex!(scamp.inb(0xED), 0x41);
}

#[test]
fn wd76c10_has_word_registers() {
    let bench = Bench::with(&[&WD76C10]);

    bench.platform.io.write16(0x1872, 0xBEEF);
    assert_eq_hex!(bench.platform.io.read16(0x1872), 0xBEEF);
    assert_eq_hex!(bench.inb(0x1873), 0xBE);

    bench.outb(0x2872, 0x34);
    bench.outb(0x2873, 0x12);
    assert_eq_hex!(bench.platform.io.read16(0x2872), 0x1234);
}

#[test]
fn fdc37c669_unlocks_with_key() {
    let bench = Bench::with(&[&FDC37C669]);

    bench.outb(0x3F0, 0x0D);
    assert_eq_hex!(bench.inb(0x3F1), 0xFF);

    bench.outb(0x3F0, 0x55);
    bench.outb(0x3F0, 0x55);
    bench.outb(0x3F0, 0x0D);
    assert_eq_hex!(bench.inb(0x3F1), 0x03);
    bench.outb(0x3F0, 0x0E);
    assert_eq_hex!(bench.inb(0x3F1), 0x02);

    // Identification is read-only, other registers are not
    bench.outb(0x3F1, 0x77);
    assert_eq_hex!(bench.inb(0x3F1), 0x02);
    bench.outb(0x3F0, 0x01);
    bench.outb(0x3F1, 0x9C);
    assert_eq_hex!(bench.inb(0x3F1), 0x9C);

    bench.outb(0x3F0, 0xAA);
    assert_eq_hex!(bench.inb(0x3F1), 0xFF);

    // The floppy controller inside answers as well
    bench.outb(0x3F2, 0x0C);
    assert_eq_hex!(bench.inb(0x3F4), 0x80);
}

#[test]
fn fdc37c669_second_chip_sits_at_secondary_base() {
    let mut bench = Bench::with(&[]);
    bench
        .devices
        .add_instance(&mut bench.platform, &bench.config, &FDC37C669, 2)
        .unwrap();

    assert!(bench.platform.io.is_bound(0x370));
    assert!(bench.platform.io.is_bound(0x375));
    assert!(!bench.platform.io.is_bound(0x3F0));
}

#[test]
fn f82c710_latches() {
    let bench = Bench::with(&[&F82C710]);

    bench.outb(0x2FA, 0x02);
    bench.outb(0x3FA, 0xFD);
    assert_eq_hex!(bench.inb(0x2FA), 0x02);
    assert_eq_hex!(bench.inb(0x3FA), 0xFD);
    assert!(!bench.platform.io.is_bound(0x2FB));
}

#[test]
fn flash_identify_and_page_write() {
    let mut flash = Sst29ee010::new(&[0x11; 0x20000]);

    flash.write(0x5555, 0xAA);
    flash.write(0x2AAA, 0x55);
    flash.write(0x5555, 0x90);
    assert_eq_hex!(flash.read(0x0000), 0xBF);
    assert_eq_hex!(flash.read(0x0001), 0x07);

    flash.write(0x0000, 0xF0);
    assert_eq_hex!(flash.read(0x0000), 0x11);

    flash.write(0x5555, 0xAA);
    flash.write(0x2AAA, 0x55);
    flash.write(0x5555, 0xA0);
    for i in 0..128u32 {
        flash.write(0x1F000 + i, i as u8);
    }
    flash.commit();

    assert_eq_hex!(flash.read(0x1F000), 0x00);
    assert_eq_hex!(flash.read(0x1F07F), 0x7F);
    assert_eq_hex!(flash.read(0x1F080), 0x11);
    assert!(flash.data()[..0x1F000].iter().all(|&b| b == 0x11));
}

#[test]
fn flash_page_write_stays_in_first_page() {
    let mut flash = Sst29ee010::new(&[0xFF; 0x20000]);

    flash.write(0x5555, 0xAA);
    flash.write(0x2AAA, 0x55);
    flash.write(0x5555, 0xA0);
    flash.write(0x0100, 0x42);
    flash.write(0x0200, 0x43);

    assert_eq_hex!(flash.read(0x0100), 0x42);
    assert_eq_hex!(flash.read(0x0200), 0xFF);
}

#[test]
fn empty_flash_reads_as_erased() {
    let mut flash = Sst29ee010::new(&[]);

    flash.write(0x5555, 0xAA);
    flash.write(0x0000, 0x12);
    assert_eq_hex!(flash.read(0x0000), 0xFF);
    assert_eq_hex!(flash.read(0x1FFFF), 0xFF);
    assert!(flash.data().is_empty());
}

#[test]
fn flash_device_claims_bios_window() {
    let mut bench = Bench::with(&[]);
    bench.platform.memory.write_8(0xE0000, 0x5A);
    bench
        .devices
        .add(&mut bench.platform, &bench.config, &SST_FLASH_29EE010)
        .unwrap();

    assert_eq!(
        bench.platform.memory.owner_of(0xFFFF0),
        Some("sst_flash_29ee010")
    );
    assert_eq!(bench.platform.memory.owner_of(0xDFFFF), None);
}

#[test]
fn video_card_publishes_active_display() {
    let mut bench = Bench::with(&[&CGA]);

    assert_eq!(bench.platform.display.get(), Some(DisplayAdapter::Cga));
    assert!(bench.platform.display.is_cga());
    assert_eq!(bench.platform.memory.owner_of(0xB8000), Some("cga"));

    bench.outb(0x3D4, 0x0E);
    bench.outb(0x3D5, 0x07);
    assert_eq_hex!(bench.inb(0x3D5), 0x07);
    let first = bench.inb(0x3DA);
    assert_ne!(first, bench.inb(0x3DA));

    bench.devices.close_all(&mut bench.platform);
    assert_eq!(bench.platform.display.get(), None);
    assert!(bench.platform.io.is_empty());
}

#[test]
fn mono_and_color_cards_coexist() {
    let bench = Bench::with(&[&MDA, &CGA]);

    assert!(bench.platform.io.is_bound(0x3B4));
    assert!(bench.platform.io.is_bound(0x3D4));
    // The card added last wins
    assert_eq!(bench.platform.display.get(), Some(DisplayAdapter::Cga));
}

#[test]
fn closing_inactive_card_keeps_active_display() {
    let mut bench = Bench::with(&[&CGA, &MDA]);
    assert_eq!(bench.platform.display.get(), Some(DisplayAdapter::Mda));

    let mut cga = VideoDevice {
        card: shared(VideoCard::new(DisplayAdapter::Cga)),
    };
    cga.close(&mut bench.platform);
    assert_eq!(bench.platform.display.get(), Some(DisplayAdapter::Mda));

    let display = ActiveDisplay::default();
    display.set(DisplayAdapter::Vga);
    display.release(DisplayAdapter::Ega);
    assert_eq!(display.get(), Some(DisplayAdapter::Vga));
    display.release(DisplayAdapter::Vga);
    assert_eq!(display.get(), None);
}

#[test]
fn crtc_follows_active_addressing() {
    let mut vga = VideoCard::new(DisplayAdapter::Vga);
    assert_eq_hex!(vga.crtc_base(), 0x3D0);

    vga.port_out(0x0C, 0x3D4);
    vga.port_out(0xFF, 0x3D5);
    vga.port_out(0x0D, 0x3D4);
    vga.port_out(0x50, 0x3D5);
    assert_eq_hex!(vga.crtc.start_address(), 0x3F50);
    // Start address is write-only
    assert_eq_hex!(vga.port_in(0x3D5), 0x00);

    // Clearing the I/O select bit moves the CRTC to mono ports
    vga.port_out(0x00, 0x3C2);
    assert_eq_hex!(vga.crtc_base(), 0x3B0);
    vga.port_out(0x0F, 0x3B4);
    vga.port_out(0x28, 0x3B5);
    assert_eq_hex!(vga.crtc.cursor_address(), 0x0028);
    assert_eq_hex!(vga.port_in(0x3D5), 0xFF);

    let mut mda = VideoCard::new(DisplayAdapter::Mda);
    mda.port_out(0x0E, 0x3B4);
    mda.port_out(0xC1, 0x3B5);
    assert_eq_hex!(mda.port_in(0x3B5), 0x01);
}

#[test]
fn pic_initialisation_sequence() {
    let bench = Bench::with(&[&AT_CORE]);

    for (cmd, data, vector, mask) in [(0x20, 0x21, 0x08, 0xB8), (0xA0, 0xA1, 0x70, 0xBD)] {
        bench.outb(cmd, 0x11);
        assert_eq_hex!(bench.inb(data), 0x00);
        bench.outb(data, vector);
        bench.outb(data, 0x04);
        bench.outb(data, 0x01);
        bench.outb(data, mask);
        assert_eq_hex!(bench.inb(data), mask);

        // OCW3 selects the in-service register
        bench.outb(cmd, 0x0B);
        assert_eq_hex!(bench.inb(cmd), 0x00);
    }
}

#[test]
fn pit_counter_reads_back_reload() {
    let bench = Bench::with(&[&AT_CORE]);

    bench.outb(0x43, 0x36);
    bench.outb(0x40, 0x9C);
    bench.outb(0x40, 0x2E);

    bench.outb(0x43, 0x00);
    assert_eq_hex!(bench.inb(0x40), 0x9C);
    assert_eq_hex!(bench.inb(0x40), 0x2E);

    // Refresh bit toggles on every read of the system control port
    bench.outb(0x61, 0x03);
    let first = bench.inb(0x61);
    let second = bench.inb(0x61);
    assert_eq_hex!(first & 0x0F, 0x03);
    assert_eq_hex!((first ^ second) & 0x10, 0x10);
}

#[test]
fn dma_controllers_and_page_registers() {
    let bench = Bench::with(&[&AT_CORE]);

    // DMA1, channel 2 address, byte-spaced registers
    bench.outb(0x0C, 0x00);
    bench.outb(0x04, 0x34);
    bench.outb(0x04, 0x12);
    bench.outb(0x0C, 0x00);
    assert_eq_hex!(bench.inb(0x04), 0x34);
    assert_eq_hex!(bench.inb(0x04), 0x12);

    // DMA2, channel 5 count, word-spaced registers
    bench.outb(0xD8, 0x00);
    bench.outb(0xC6, 0xFF);
    bench.outb(0xC6, 0x7F);
    bench.outb(0xD8, 0x00);
    assert_eq_hex!(bench.inb(0xC6), 0xFF);
    assert_eq_hex!(bench.inb(0xC6), 0x7F);

    bench.outb(0x81, 0x0A);
    bench.outb(0x8F, 0x55);
    assert_eq_hex!(bench.inb(0x81), 0x0A);
    assert_eq_hex!(bench.inb(0x8F), 0x55);

    bench.outb(0x0F, 0x05);
    assert_eq_hex!(bench.inb(0x08), 0x00);
}

#[test]
fn dma2_registers_are_word_spaced() {
    let mut dma2 = DMA8237::new(0xC0, 1);

    // Channel 6 address and count of the second controller
    dma2.port_out(0x00, 0xD8);
    dma2.port_out(0x00, 0xC8);
    dma2.port_out(0x40, 0xC8);
    dma2.port_out(0xFF, 0xCA);
    dma2.port_out(0x01, 0xCA);

    assert_eq!(dma2.channel_addr(2), Some(0x4000));
    assert_eq!(dma2.channel_length(2), Some(0x01FF));
    assert_eq!(dma2.channel_addr(0), Some(0x0000));
    assert_eq!(dma2.channel_addr(4), None);

    dma2.reset();
    assert_eq!(dma2.channel_length(2), Some(0x0000));
}

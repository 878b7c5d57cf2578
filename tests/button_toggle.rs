//
// button_toggle.rs --- End-to-end test of the LED toggle firmware.
//
// Copyright (C) 2016, James Bielman <jamesjb@gmail.com>
// All Rights Reserved.
//
// Released under the "BSD3" license. See the file "LICENSE"
// for details.
//

// A button on PB5 toggles an LED on PB0 through the PCINT0 handler.
// The firmware is assembled, written out as Intel HEX and loaded back
// the same way the emulator tool loads it.

use avr8::emu::io::{DDRB, PCICR, PCMSK0, PINB, PORTB};
use avr8::emu::program::assemble;
use avr8::emu::{Firmware, Mem, Opcode::*, Port, Status, CPU, DataMemory};
use ihex::Record;

const MAIN: u8 = 8;
const MAIN_LOOP: u8 = 9;
const LED1_TOGGLE: u8 = 10;
const LED1_ON: u8 = 19;
const SETUP: u8 = 25;
const ISR_PCINT0: u8 = 35;
const ISR_PCINT0_END: u8 = 39;

const LED1: u8 = 0;
const BUTTON1: u8 = 5;
const LED1_ENABLED: u16 = 1000;

const XL: u8 = 28;
const XH: u8 = 29;

const SYMBOLS: &str = "\
# LED toggle firmware
00 RESET_vect
02 PCINT0_vect
08 main
0A led1_toggle
0D led1_off
13 led1_on
19 setup
23 ISR_PCINT0
";

fn assemble_firmware() -> Firmware {
    let mut fw = Firmware::new();

    fw.emit(Jmp, MAIN, 0)
      .org(2)
      .emit(Jmp, ISR_PCINT0, 0)
      .org(MAIN as usize);

    // main
    fw.emit(Call, SETUP, 0)
      .emit(Jmp, MAIN_LOOP, 0);

    // led1_toggle
    fw.emit(Ld, 16, XL)
      .emit(Cpi, 16, 0x00)
      .emit(Breq, LED1_ON, 0);

    // led1_off
    fw.emit(In, 16, PORTB)
      .emit(Andi, 16, !(1 << LED1))
      .emit(Out, PORTB, 16)
      .emit(Ldi, 16, 0x00)
      .emit(St, XL, 16)
      .emit(Ret, 0, 0);

    // led1_on
    fw.emit(In, 16, PORTB)
      .emit(Ori, 16, 1 << LED1)
      .emit(Out, PORTB, 16)
      .emit(Ldi, 16, 0x01)
      .emit(St, XL, 16)
      .emit(Ret, 0, 0);

    // setup
    fw.emit(Ldi, 16, 1 << LED1)
      .emit(Out, DDRB, 16)
      .emit(Ldi, 17, 1 << BUTTON1)
      .emit(Out, PORTB, 17)
      .emit(Sei, 0, 0)
      .emit(Sts, PCICR, 16)
      .emit(Sts, PCMSK0, 17)
      .emit(Ldi, XL, LED1_ENABLED as u8)
      .emit(Ldi, XH, (LED1_ENABLED >> 8) as u8)
      .emit(Ret, 0, 0);

    // ISR_PCINT0
    fw.emit(In, 16, PINB)
      .emit(Andi, 16, 1 << BUTTON1)
      .emit(Breq, ISR_PCINT0_END, 0)
      .emit(Call, LED1_TOGGLE, 0)
      .emit(Reti, 0, 0);

    fw
}

/// Write `fw` as Intel HEX text, 16 bytes per record.
fn to_ihex(fw: &Firmware) -> String {
    let bytes: Vec<u8> = fw.words()
        .iter()
        .flat_map(|w| vec![(w >> 16) as u8, (w >> 8) as u8, *w as u8])
        .collect();

    let mut records: Vec<Record> = bytes.chunks(16)
        .enumerate()
        .map(|(i, chunk)| Record::Data { offset: (i * 16) as u16, value: chunk.to_vec() })
        .collect();
    records.push(Record::EndOfFile);

    ihex::create_object_file_representation(&records).unwrap()
}

fn boot() -> CPU<DataMemory> {
    let mut fw = Firmware::new();
    fw.load_ihex(&to_ihex(&assemble_firmware())).unwrap();
    fw.load_symbols(SYMBOLS).unwrap();

    let mut cpu = CPU::new(DataMemory::new(), fw).unwrap();
    assert!(cpu.run_until(MAIN_LOOP, 100));
    cpu
}

fn led_enabled(cpu: &CPU<DataMemory>) -> u8 {
    cpu.mem.loadb(LED1_ENABLED + 256)
}

/// Change the button and run until the handler has returned.
fn press(cpu: &mut CPU<DataMemory>, down: bool) {
    cpu.set_pin(Port::B, BUTTON1, down);
    cpu.step();
    assert_eq!(cpu.pc(), 2);
    assert!(cpu.run_until(MAIN_LOOP, 100));
    assert!(cpu.stack.is_empty());
    assert!(cpu.status().contains(Status::I));
}

#[test]
fn loaded_image_matches_assembly() {
    let mut fw = Firmware::new();
    fw.load_ihex(&to_ihex(&assemble_firmware())).unwrap();

    assert_eq!(fw, assemble_firmware());
    assert_eq!(fw.len(), 40);
    assert_eq!(fw.words()[37], assemble(Breq, ISR_PCINT0_END, 0));
}

#[test]
fn setup_configures_ports() {
    let cpu = boot();

    assert_eq!(cpu.port_direction(Port::B), 1 << LED1);
    assert_eq!(cpu.port_output(Port::B), 1 << BUTTON1);
    assert_eq!(cpu.regs.x(), LED1_ENABLED);
    assert_eq!(cpu.mem.loadb(256 + PCICR as u16), 0x01);
    assert_eq!(cpu.mem.loadb(256 + PCMSK0 as u16), 1 << BUTTON1);
    assert!(cpu.stack.is_empty());
}

#[test]
fn button_toggles_led() {
    let mut cpu = boot();

    press(&mut cpu, true);
    assert_eq!(cpu.port_output(Port::B), (1 << BUTTON1) | (1 << LED1));
    assert_eq!(led_enabled(&cpu), 1);

    // Release changes nothing.
    press(&mut cpu, false);
    assert_eq!(cpu.port_output(Port::B), (1 << BUTTON1) | (1 << LED1));
    assert_eq!(led_enabled(&cpu), 1);

    press(&mut cpu, true);
    assert_eq!(cpu.port_output(Port::B), 1 << BUTTON1);
    assert_eq!(led_enabled(&cpu), 0);
}

#[test]
fn handler_is_named() {
    let mut cpu = boot();

    cpu.set_pin(Port::B, BUTTON1, true);
    cpu.step();
    cpu.step();
    assert_eq!(cpu.current_subroutine(), Some("PCINT0_vect"));
    assert_eq!(cpu.pc(), ISR_PCINT0);

    cpu.step();
    assert_eq!(cpu.current_subroutine(), Some("ISR_PCINT0"));
    assert_eq!(cpu.regs.r(16), 1 << BUTTON1);

    assert!(cpu.run_until(LED1_ON, 10));
    cpu.step();
    assert_eq!(cpu.current_subroutine(), Some("led1_on"));
}

// An idle button never interrupts the main loop.
#[test]
fn idle_loop() {
    let mut cpu = boot();

    for _ in 0..50 {
        cpu.step();
        assert_eq!(cpu.pc(), MAIN_LOOP);
    }
    assert_eq!(cpu.current_subroutine(), Some("main"));
    assert!(cpu.stack.is_empty());
}

//! CPU execution tests over encoder-built code buffers.

use riscv32_emu::{Cpu, Memory, StepStatus};
use riscv32_isa as isa;
use riscv32_isa::Gpr;

/// Build a CPU and a small memory image with `words` loaded at 0.
fn setup(words: &[u32]) -> (Cpu, Memory) {
    let mut mem = Memory::with_size(0x1_0000);
    for (i, word) in words.iter().enumerate() {
        mem.write32(i as u32 * 4, *word).unwrap();
    }
    (Cpu::new(), mem)
}

fn step_ok(cpu: &mut Cpu, mem: &mut Memory) {
    assert_eq!(cpu.step(mem), StepStatus::Ok);
}

#[test]
fn test_add_and_sub() {
    let (mut cpu, mut mem) = setup(&[
        isa::addi(Gpr::A0, Gpr::ZERO, 10),
        isa::addi(Gpr::A1, Gpr::ZERO, 20),
        isa::add(Gpr::A2, Gpr::A0, Gpr::A1),
        isa::sub(Gpr::A3, Gpr::A0, Gpr::A1),
    ]);
    for _ in 0..4 {
        step_ok(&mut cpu, &mut mem);
    }
    assert_eq!(cpu.get_register(Gpr::A2.num()), 30);
    assert_eq!(cpu.get_register(Gpr::A3.num()) as i32, -10);
}

#[test]
fn test_zero_register_stays_zero() {
    let (mut cpu, mut mem) = setup(&[
        isa::addi(Gpr::A0, Gpr::ZERO, 100),
        isa::add(Gpr::ZERO, Gpr::A0, Gpr::A0),
    ]);
    step_ok(&mut cpu, &mut mem);
    step_ok(&mut cpu, &mut mem);
    assert_eq!(cpu.get_register(0), 0);
    assert_eq!(cpu.get_register(Gpr::A0.num()), 100);
}

#[test]
fn test_shifts() {
    let (mut cpu, mut mem) = setup(&[
        isa::addi(Gpr::A0, Gpr::ZERO, -8),
        isa::srai(Gpr::A1, Gpr::A0, 1),
        isa::srli(Gpr::A2, Gpr::A0, 1),
        isa::slli(Gpr::A3, Gpr::A0, 4),
    ]);
    for _ in 0..4 {
        step_ok(&mut cpu, &mut mem);
    }
    assert_eq!(cpu.get_register(Gpr::A1.num()) as i32, -4);
    assert_eq!(cpu.get_register(Gpr::A2.num()), 0x7FFF_FFFC);
    assert_eq!(cpu.get_register(Gpr::A3.num()) as i32, -128);
}

#[test]
fn test_set_less_than() {
    let (mut cpu, mut mem) = setup(&[
        isa::addi(Gpr::A0, Gpr::ZERO, -1),
        isa::addi(Gpr::A1, Gpr::ZERO, 1),
        isa::slt(Gpr::A2, Gpr::A0, Gpr::A1),
        isa::sltu(Gpr::A3, Gpr::A0, Gpr::A1),
        isa::slti(Gpr::A4, Gpr::A1, 100),
        isa::sltiu(Gpr::A5, Gpr::A1, 0),
    ]);
    for _ in 0..6 {
        step_ok(&mut cpu, &mut mem);
    }
    assert_eq!(cpu.get_register(Gpr::A2.num()), 1); // signed: -1 < 1
    assert_eq!(cpu.get_register(Gpr::A3.num()), 0); // unsigned: 0xFFFFFFFF > 1
    assert_eq!(cpu.get_register(Gpr::A4.num()), 1);
    assert_eq!(cpu.get_register(Gpr::A5.num()), 0);
}

#[test]
fn test_branch_taken_and_not_taken() {
    let (mut cpu, mut mem) = setup(&[
        isa::addi(Gpr::A0, Gpr::ZERO, 5),
        isa::addi(Gpr::A1, Gpr::ZERO, 5),
        isa::beq(Gpr::A0, Gpr::A1, 12), // taken: skips the next two words
        isa::addi(Gpr::A2, Gpr::ZERO, 1),
        isa::addi(Gpr::A2, Gpr::ZERO, 2),
        isa::bne(Gpr::A0, Gpr::A1, 8), // not taken
        isa::addi(Gpr::A3, Gpr::ZERO, 7),
    ]);
    for _ in 0..5 {
        step_ok(&mut cpu, &mut mem);
    }
    // The branch at pc=8 jumped to 8+12=20, so a2 was never written.
    assert_eq!(cpu.get_register(Gpr::A2.num()), 0);
    assert_eq!(cpu.get_register(Gpr::A3.num()), 7);
    assert_eq!(cpu.get_pc(), 28);
}

#[test]
fn test_backward_branch() {
    // Counts a1 down from 3; the bne at pc=4 loops back to 0.
    let (mut cpu, mut mem) = setup(&[
        isa::addi(Gpr::A1, Gpr::A1, 1),
        isa::bne(Gpr::A1, Gpr::A0, -4),
    ]);
    cpu.set_register(Gpr::A0.num(), 3);
    for _ in 0..6 {
        step_ok(&mut cpu, &mut mem);
    }
    assert_eq!(cpu.get_register(Gpr::A1.num()), 3);
    assert_eq!(cpu.get_pc(), 8);
}

#[test]
fn test_jal_links_return_address() {
    let (mut cpu, mut mem) = setup(&[
        isa::jal(Gpr::RA, 8),
        isa::addi(Gpr::A0, Gpr::ZERO, 1), // skipped
        isa::addi(Gpr::A0, Gpr::ZERO, 42),
    ]);
    step_ok(&mut cpu, &mut mem);
    assert_eq!(cpu.get_register(Gpr::RA.num()), 4);
    assert_eq!(cpu.get_pc(), 8);
    step_ok(&mut cpu, &mut mem);
    assert_eq!(cpu.get_register(Gpr::A0.num()), 42);
}

#[test]
fn test_jalr_masks_low_bit() {
    let (mut cpu, mut mem) = setup(&[
        isa::addi(Gpr::T0, Gpr::ZERO, 0x103),
        isa::jalr(Gpr::RA, Gpr::T0, 0),
    ]);
    step_ok(&mut cpu, &mut mem);
    step_ok(&mut cpu, &mut mem);
    assert_eq!(cpu.get_register(Gpr::RA.num()), 8);
    assert_eq!(cpu.get_pc(), 0x102);
    // 0x102 is not 4-byte aligned, so the next fetch reports it.
    assert_eq!(cpu.step(&mut mem), StepStatus::FetchMisaligned);
}

#[test]
fn test_lui_and_auipc() {
    let (mut cpu, mut mem) = setup(&[
        isa::lui(Gpr::A0, 0x12345),
        isa::auipc(Gpr::A1, 1),
    ]);
    step_ok(&mut cpu, &mut mem);
    step_ok(&mut cpu, &mut mem);
    assert_eq!(cpu.get_register(Gpr::A0.num()), 0x1234_5000);
    // auipc executes at pc=4: 4 + 0x1000
    assert_eq!(cpu.get_register(Gpr::A1.num()), 0x1004);
}

#[test]
fn test_load_sign_extension() {
    let (mut cpu, mut mem) = setup(&[
        isa::lb(Gpr::RA, Gpr::ZERO, 0x200),
        isa::lbu(Gpr::SP, Gpr::ZERO, 0x200),
        isa::lh(Gpr::GP, Gpr::ZERO, 0x300),
        isa::lhu(Gpr::TP, Gpr::ZERO, 0x300),
    ]);
    mem.write8(0x200, 0xEF).unwrap();
    mem.write16(0x300, 0x8001).unwrap();
    for _ in 0..4 {
        step_ok(&mut cpu, &mut mem);
    }
    assert_eq!(cpu.get_register(Gpr::RA.num()), 0xFFFF_FFEF);
    assert_eq!(cpu.get_register(Gpr::SP.num()), 0x0000_00EF);
    assert_eq!(cpu.get_register(Gpr::GP.num()), 0xFFFF_8001);
    assert_eq!(cpu.get_register(Gpr::TP.num()), 0x0000_8001);
}

#[test]
fn test_store_truncation() {
    let (mut cpu, mut mem) = setup(&[
        isa::lui(Gpr::A0, 0x12345),
        isa::addi(Gpr::A0, Gpr::A0, 0x678),
        isa::sb(Gpr::ZERO, Gpr::A0, 0x400),
        isa::sh(Gpr::ZERO, Gpr::A0, 0x404),
        isa::sw(Gpr::ZERO, Gpr::A0, 0x408),
    ]);
    for _ in 0..5 {
        step_ok(&mut cpu, &mut mem);
    }
    assert_eq!(mem.read32(0x400), Ok(0x0000_0078));
    assert_eq!(mem.read32(0x404), Ok(0x0000_5678));
    assert_eq!(mem.read32(0x408), Ok(0x1234_5678));
}

#[test]
fn test_writes_to_text_are_visible_to_fetch() {
    // Overwrite the third slot with `addi a0, zero, 9` before reaching it.
    let patch = isa::addi(Gpr::A0, Gpr::ZERO, 9);
    let (mut cpu, mut mem) = setup(&[
        isa::lui(Gpr::T0, patch >> 12),
        isa::addi(Gpr::T0, Gpr::T0, (patch & 0xFFF) as i32),
        isa::sw(Gpr::ZERO, Gpr::T0, 12),
        isa::addi(Gpr::A0, Gpr::ZERO, 1), // will be replaced
    ]);
    for _ in 0..4 {
        step_ok(&mut cpu, &mut mem);
    }
    assert_eq!(cpu.get_register(Gpr::A0.num()), 9);
}

#[test]
fn test_illegal_load_funct3() {
    // funct3=3 is undefined for loads: valid shape, illegal sub-encoding.
    let word = riscv32_isa::encode_i(0, 0, 0x3, 1, 0x03);
    let (mut cpu, mut mem) = setup(&[word]);
    assert_eq!(cpu.step(&mut mem), StepStatus::IllegalInstruction);
}

#[test]
fn test_unknown_opcode_is_decode_error() {
    let (mut cpu, mut mem) = setup(&[0xFFFF_FFFF]);
    assert_eq!(cpu.step(&mut mem), StepStatus::DecodeError);
}

#[test]
fn test_fetch_misaligned() {
    let (mut cpu, mut mem) = setup(&[isa::ecall()]);
    cpu.set_pc(2);
    assert_eq!(cpu.step(&mut mem), StepStatus::FetchMisaligned);
    // PC did not advance.
    assert_eq!(cpu.get_pc(), 2);
}

#[test]
fn test_fetch_out_of_bounds() {
    let (mut cpu, mut mem) = setup(&[isa::ecall()]);
    cpu.set_pc(0x10_0000);
    assert_eq!(cpu.step(&mut mem), StepStatus::FetchOutOfBounds);
}

#[test]
fn test_ebreak_continues() {
    let (mut cpu, mut mem) = setup(&[isa::ebreak(), isa::addi(Gpr::A0, Gpr::ZERO, 3)]);
    assert_eq!(cpu.step(&mut mem), StepStatus::Ok);
    step_ok(&mut cpu, &mut mem);
    assert_eq!(cpu.get_register(Gpr::A0.num()), 3);
}

#[test]
fn test_exit_syscall_reports_on_exact_step() {
    let (mut cpu, mut mem) = setup(&[
        isa::addi(Gpr::A0, Gpr::ZERO, 17),
        isa::addi(Gpr::A7, Gpr::ZERO, 93),
        isa::ecall(),
    ]);
    step_ok(&mut cpu, &mut mem);
    step_ok(&mut cpu, &mut mem);
    assert_eq!(cpu.step(&mut mem), StepStatus::SyscallExit);
    assert_eq!(cpu.get_register(10), 17);
    assert!(!cpu.is_running());
    // Further steps keep reporting exit.
    assert_eq!(cpu.step(&mut mem), StepStatus::SyscallExit);
}

// Register map - Memory-mapped I/O register addresses
//
// Shared between the bus and the components so range tables and register
// decoders agree on one set of names. Addresses are bank-local offsets;
// the bus drops the bank before dispatching to I/O components.

// Interrupt vectors
pub const IV_NMI: u32 = 0xFFEA;
pub const IV_RESET: u32 = 0xFFFC;
pub const IV_IRQ: u32 = 0xFFEE;

// PPU registers, write side ($2100-$2133)
pub const INIDISP: u16 = 0x2100;
pub const OBSEL: u16 = 0x2101;
pub const OAMADDL: u16 = 0x2102;
pub const OAMADDH: u16 = 0x2103;
pub const OAMDATA: u16 = 0x2104;
pub const BGMODE: u16 = 0x2105;
pub const MOSAIC: u16 = 0x2106;
pub const BG1SC: u16 = 0x2107;
pub const BG2SC: u16 = 0x2108;
pub const BG3SC: u16 = 0x2109;
pub const BG4SC: u16 = 0x210A;
pub const BG12NBA: u16 = 0x210B;
pub const BG34NBA: u16 = 0x210C;
pub const BG1HOFS: u16 = 0x210D;
pub const BG1VOFS: u16 = 0x210E;
pub const BG2HOFS: u16 = 0x210F;
pub const BG2VOFS: u16 = 0x2110;
pub const BG3HOFS: u16 = 0x2111;
pub const BG3VOFS: u16 = 0x2112;
pub const BG4HOFS: u16 = 0x2113;
pub const BG4VOFS: u16 = 0x2114;
pub const VMAIN: u16 = 0x2115;
pub const VMADDL: u16 = 0x2116;
pub const VMADDH: u16 = 0x2117;
pub const VMDATAL: u16 = 0x2118;
pub const VMDATAH: u16 = 0x2119;
pub const M7SEL: u16 = 0x211A;
pub const M7A: u16 = 0x211B;
pub const M7B: u16 = 0x211C;
pub const M7C: u16 = 0x211D;
pub const M7D: u16 = 0x211E;
pub const M7X: u16 = 0x211F;
pub const M7Y: u16 = 0x2120;
pub const CGADD: u16 = 0x2121;
pub const CGDATA: u16 = 0x2122;
pub const W12SEL: u16 = 0x2123;
pub const W34SEL: u16 = 0x2124;
pub const WOBJSEL: u16 = 0x2125;
pub const WH0: u16 = 0x2126;
pub const WH1: u16 = 0x2127;
pub const WH2: u16 = 0x2128;
pub const WH3: u16 = 0x2129;
pub const WBGLOG: u16 = 0x212A;
pub const WOBJLOG: u16 = 0x212B;
pub const TM: u16 = 0x212C;
pub const TS: u16 = 0x212D;
pub const TMW: u16 = 0x212E;
pub const TSW: u16 = 0x212F;
pub const CGWSEL: u16 = 0x2130;
pub const CGADSUB: u16 = 0x2131;
pub const COLDATA: u16 = 0x2132;
pub const SETINI: u16 = 0x2133;

// PPU registers, read side ($2134-$213F)
pub const MPYL: u16 = 0x2134;
pub const MPYM: u16 = 0x2135;
pub const MPYH: u16 = 0x2136;
pub const SLHV: u16 = 0x2137;
pub const OAMDATAREAD: u16 = 0x2138;
pub const VMDATALREAD: u16 = 0x2139;
pub const VMDATAHREAD: u16 = 0x213A;
pub const CGDATAREAD: u16 = 0x213B;
pub const OPHCT: u16 = 0x213C;
pub const OPVCT: u16 = 0x213D;
pub const STAT77: u16 = 0x213E;
pub const STAT78: u16 = 0x213F;

// APU mailbox ports
pub const APUIO0: u16 = 0x2140;
pub const APUIO1: u16 = 0x2141;
pub const APUIO2: u16 = 0x2142;
pub const APUIO3: u16 = 0x2143;

// WRAM indirect window
pub const WMDATA: u16 = 0x2180;
pub const WMADDL: u16 = 0x2181;
pub const WMADDM: u16 = 0x2182;
pub const WMADDH: u16 = 0x2183;

// Joypad registers
pub const JOYWR: u16 = 0x4016;
pub const JOYA: u16 = 0x4016;
pub const JOYB: u16 = 0x4017;
pub const WRIO: u16 = 0x4201;
pub const RDIO: u16 = 0x4213;
pub const JOY1L: u16 = 0x4218;
pub const JOY1H: u16 = 0x4219;
pub const JOY2L: u16 = 0x421A;
pub const JOY2H: u16 = 0x421B;
pub const JOY3L: u16 = 0x421C;
pub const JOY3H: u16 = 0x421D;
pub const JOY4L: u16 = 0x421E;
pub const JOY4H: u16 = 0x421F;

// Interrupt / timing registers
pub const NMITIMEN: u16 = 0x4200;
pub const HTIMEL: u16 = 0x4207;
pub const HTIMEH: u16 = 0x4208;
pub const VTIMEL: u16 = 0x4209;
pub const VTIMEH: u16 = 0x420A;
pub const RDNMI: u16 = 0x4210;
pub const TIMEUP: u16 = 0x4211;
pub const HVBJOY: u16 = 0x4212;

// Math registers
pub const WRMPYA: u16 = 0x4202;
pub const WRMPYB: u16 = 0x4203;
pub const WRDIVL: u16 = 0x4204;
pub const WRDIVH: u16 = 0x4205;
pub const WRDIVB: u16 = 0x4206;
pub const RDDIVL: u16 = 0x4214;
pub const RDDIVH: u16 = 0x4215;
pub const RDMPYL: u16 = 0x4216;
pub const RDMPYH: u16 = 0x4217;

// DMA/HDMA registers
pub const MDMAEN: u16 = 0x420B;
pub const HDMAEN: u16 = 0x420C;
pub const DMA_START: u16 = 0x4300;
pub const DMA_END: u16 = 0x437F;

// Bus-internal registers
pub const MEMSEL: u16 = 0x420D;

use anyhow::Result;

use molshare::{
    build_share_url, decode_share_segment, decode_share_segment_encrypted, encode_share_data,
    encode_share_data_encrypted, Atom, Bond, BondOrder, DecodedShare, ShareOptions,
};

use crate::cli::{Command, DecodeArgs, EncodeArgs, InspectArgs};
use crate::io;

pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Encode(args) => run_encode(args),
        Command::Decode(args) => run_decode(args),
        Command::Inspect(args) => run_inspect(args),
    }
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    let doc = io::read_document(args.input.as_deref())?;
    let (molecule, style) = io::into_molecule(doc)?;

    let options = ShareOptions {
        omit_bonds: args.omit_bonds,
        precision_drop: args.precision_drop,
        use_delta: !args.no_delta,
        title: args.title.or_else(|| molecule.title.clone()),
    };

    let encoded = match &args.password {
        Some(password) => encode_share_data_encrypted(&molecule, &style, &options, password)?,
        None => encode_share_data(&molecule, &style, &options)?,
    };

    eprintln!(
        "{} atoms, {} bonds, {} bytes, {} characters",
        encoded.payload.atom_count,
        encoded.payload.bond_count,
        encoded.byte_length,
        encoded.encoded.len()
    );
    match &args.url {
        Some(base) => println!("{}", build_share_url(base, &encoded.encoded)),
        None => println!("{}", encoded.encoded),
    }
    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let decoded = decode(&args.segment, args.password.as_deref())?;
    let doc = io::from_molecule(&decoded.molecule, &decoded.style);
    io::write_document(args.output.as_deref(), &doc)?;
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let decoded = match decode(&args.segment, args.password.as_deref()) {
        Ok(decoded) => decoded,
        // Version and flags are readable without the password.
        Err(molshare::Error::PasswordRequired) => {
            println!("format:       mtg-v1");
            println!("encrypted:    yes (password required for contents)");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let meta = &decoded.payload;
    println!("format:       {}", meta.version);
    println!("atoms:        {}", meta.atom_count);
    println!("bonds:        {}", meta.bond_count);
    println!("scale exp:    {}", meta.scale_exp);
    println!("coord bits:   {}", meta.coord_bits);
    println!("delta coded:  {}", meta.delta);
    println!("bonds omitted: {}", meta.bonds_omitted);
    if let Some(title) = &meta.title {
        println!("title:        {title}");
    }
    Ok(())
}

fn decode(input: &str, password: Option<&str>) -> Result<DecodedShare, molshare::Error> {
    let segment = io::extract_segment(input);
    match password {
        Some(password) => decode_share_segment_encrypted(segment, password, guess_bonds),
        None => decode_share_segment(segment, guess_bonds),
    }
}

/// Distance-based bond inference for streams written without bonds: pairs
/// closer than a cutoff get a single bond. Hydrogen pairs never bond and
/// hydrogen cutoffs are shorter.
fn guess_bonds(atoms: &[Atom]) -> Vec<Bond> {
    const CUTOFF: f64 = 1.8;
    const H_CUTOFF: f64 = 1.3;

    let mut bonds = Vec::new();
    for i in 0..atoms.len() {
        for j in (i + 1)..atoms.len() {
            let h_i = atoms[i].symbol == "H";
            let h_j = atoms[j].symbol == "H";
            if h_i && h_j {
                continue;
            }
            let cutoff = if h_i || h_j { H_CUTOFF } else { CUTOFF };
            let d2: f64 = (0..3)
                .map(|k| (atoms[i].position[k] - atoms[j].position[k]).powi(2))
                .sum();
            if d2 <= cutoff * cutoff {
                bonds.push(Bond::new(i, j, BondOrder::Single));
            }
        }
    }
    bonds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guessed_bonds_respect_cutoffs() {
        let atoms = vec![
            Atom::new("C", [0.0, 0.0, 0.0]),
            Atom::new("O", [1.2, 0.0, 0.0]),
            Atom::new("H", [-1.0, 0.0, 0.0]),
            Atom::new("H", [-1.9, 0.5, 0.0]),
            Atom::new("N", [4.0, 0.0, 0.0]),
        ];
        let bonds = guess_bonds(&atoms);
        assert!(bonds.contains(&Bond::new(0, 1, BondOrder::Single)));
        assert!(bonds.contains(&Bond::new(0, 2, BondOrder::Single)));
        // Hydrogens never bond to each other, distant atoms stay isolated.
        assert!(!bonds.iter().any(|b| b.i == 2 && b.j == 3));
        assert!(!bonds.iter().any(|b| b.j == 4));
    }
}
